// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generation-checked handles to binding service instances.

use core::fmt;

/// A handle to an instance registered with a
/// [`DataBindingService`](crate::DataBindingService).
///
/// Handles pair a slot index with the generation the slot had when the
/// instance was created. When a slot is reclaimed its generation is bumped,
/// so handles to a destroyed instance stop resolving instead of aliasing
/// whatever reuses the slot.
///
/// The default handle is [`INVALID`](Self::INVALID): generation zero is
/// reserved and never issued.
///
/// # Example
///
/// ```
/// use canopy_binding::DataBindingInstanceHandle;
///
/// let handle = DataBindingInstanceHandle::default();
/// assert!(!handle.is_valid());
/// assert_eq!(handle, DataBindingInstanceHandle::INVALID);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DataBindingInstanceHandle {
    index: u32,
    generation: u32,
}

impl DataBindingInstanceHandle {
    /// The invalid handle. Never resolves.
    pub const INVALID: Self = Self {
        index: 0,
        generation: 0,
    };

    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        debug_assert!(generation != 0);
        Self { index, generation }
    }

    /// Returns `true` if this is not the invalid sentinel.
    ///
    /// A valid handle may still refer to an instance that has since been
    /// destroyed; resolution against the service is what detects staleness.
    #[must_use]
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.generation != 0
    }

    pub(crate) const fn index(self) -> u32 {
        self.index
    }

    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}

impl Default for DataBindingInstanceHandle {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Debug for DataBindingInstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            f.debug_struct("DataBindingInstanceHandle")
                .field("index", &self.index)
                .field("generation", &self.generation)
                .finish()
        } else {
            f.write_str("DataBindingInstanceHandle(INVALID)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_invalid() {
        let handle = DataBindingInstanceHandle::default();
        assert!(!handle.is_valid());
        assert_eq!(handle, DataBindingInstanceHandle::INVALID);
    }

    #[test]
    fn constructed_handles_are_valid_and_distinct() {
        let a = DataBindingInstanceHandle::new(0, 1);
        let b = DataBindingInstanceHandle::new(0, 2);
        let c = DataBindingInstanceHandle::new(1, 1);

        assert!(a.is_valid());
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, DataBindingInstanceHandle::INVALID);
    }

    #[test]
    fn debug_marks_invalid() {
        use alloc::format;
        let text = format!("{:?}", DataBindingInstanceHandle::INVALID);
        assert!(text.contains("INVALID"));
    }
}
