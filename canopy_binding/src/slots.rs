// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational slot storage backing the instance registry.

use alloc::vec::Vec;

use crate::handle::DataBindingInstanceHandle;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// A slot arena addressed by [`DataBindingInstanceHandle`].
///
/// Inserting yields a handle carrying the slot's current generation.
/// Removing bumps the generation, so outstanding handles to the removed
/// value no longer resolve, even after the slot is reused.
pub(crate) struct SlotArena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> SlotArena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn insert(&mut self, value: T) -> DataBindingInstanceHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none());
            slot.value = Some(value);
            return DataBindingInstanceHandle::new(index, slot.generation);
        }
        let index = u32::try_from(self.slots.len()).expect("slot arena exhausted");
        self.slots.push(Slot {
            generation: 1,
            value: Some(value),
        });
        DataBindingInstanceHandle::new(index, 1)
    }

    pub(crate) fn get(&self, handle: DataBindingInstanceHandle) -> Option<&T> {
        if !handle.is_valid() {
            return None;
        }
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
    }

    pub(crate) fn get_mut(&mut self, handle: DataBindingInstanceHandle) -> Option<&mut T> {
        if !handle.is_valid() {
            return None;
        }
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_mut())
    }

    /// Removes the value, bumping the slot generation so the handle (and any
    /// copy of it) stops resolving.
    pub(crate) fn remove(&mut self, handle: DataBindingInstanceHandle) -> Option<T> {
        if !handle.is_valid() {
            return None;
        }
        let slot = self
            .slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1).max(1);
        self.free.push(handle.index());
        self.len -= 1;
        Some(value)
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> core::fmt::Debug for SlotArena<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SlotArena")
            .field("len", &self.len)
            .field("capacity", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_get() {
        let mut arena = SlotArena::new();
        assert_eq!(arena.len(), 0);

        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(a), Some(&"a"));
        assert_eq!(arena.get(b), Some(&"b"));
        assert_ne!(a, b);
    }

    #[test]
    fn invalid_handle_never_resolves() {
        let mut arena = SlotArena::new();
        let _ = arena.insert(1_u32);
        assert_eq!(arena.get(DataBindingInstanceHandle::INVALID), None);
        assert_eq!(arena.remove(DataBindingInstanceHandle::INVALID), None);
    }

    #[test]
    fn remove_invalidates_handle() {
        let mut arena = SlotArena::new();
        let a = arena.insert(10_u32);
        assert_eq!(arena.remove(a), Some(10));
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.remove(a), None);
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn reused_slot_does_not_alias_old_handle() {
        let mut arena = SlotArena::new();
        let a = arena.insert(10_u32);
        arena.remove(a);

        let b = arena.insert(20_u32);
        // Same slot, new generation.
        assert_ne!(a, b);
        assert_eq!(arena.get(a), None);
        assert_eq!(arena.get(b), Some(&20));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut arena = SlotArena::new();
        let a = arena.insert(1_u32);
        *arena.get_mut(a).unwrap() = 5;
        assert_eq!(arena.get(a), Some(&5));
    }
}
