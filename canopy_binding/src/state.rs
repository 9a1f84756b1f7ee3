// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Packed per-instance state for the binding service registry.

use core::fmt;

/// What kind of bindable entity a registry instance represents.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataBindingInstanceType {
    /// A container for dependency properties (a control).
    DependencyObject = 0,
    /// A container observed as a whole (an observable model object).
    DataSourceObject = 1,
    /// A read-write property that can be a binding source or target.
    DependencyProperty = 2,
    /// A property that can only act as a binding source.
    ReadOnlyDependencyProperty = 3,
    /// A callback slot notified when its bound source changes.
    DependencyObserverProperty = 4,
}

/// Lifecycle of a registry instance.
///
/// Only the owning [`DataBindingService`](crate::DataBindingService) mutates
/// this field. An instance goes `Alive` → `DestroyScheduled` when its owner
/// schedules destruction; the deferred destroy at the start of the next
/// propagation pass reclaims the slot, which is the `Destroyed` transition.
/// A dead instance never returns to `Alive`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DataBindingInstanceState {
    /// The instance can participate in bindings and change scheduling.
    Alive = 0,
    /// Destruction is pending; the instance no longer accepts work.
    DestroyScheduled = 1,
    /// Terminal state. Slot reclamation subsumes it: lookups report `None`
    /// rather than this value.
    Destroyed = 2,
}

/// Which accessor-table implementation a property instance carries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PropertyMethodsImplType {
    /// No accessor table (containers).
    NotAvailable = 0,
    /// Read-write typed accessors.
    DependencyProperty = 1,
    /// Source-only typed accessors.
    ReadOnlyDependencyProperty = 2,
    /// Observer callback invoker.
    Observer = 3,
}

/// How an instance is currently queued for the next propagation pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PropertyChangeState {
    /// Not queued.
    Unchanged = 0,
    /// Queued to re-push its current value (no local modification).
    Refresh = 1,
    /// Queued because its value was modified.
    Modified = 2,
}

/// Why a property reports a change.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyChangeReason {
    /// Re-push the current value to targets.
    Refresh,
    /// The value was modified.
    Modified,
}

impl From<PropertyChangeReason> for PropertyChangeState {
    fn from(reason: PropertyChangeReason) -> Self {
        match reason {
            PropertyChangeReason::Refresh => Self::Refresh,
            PropertyChangeReason::Modified => Self::Modified,
        }
    }
}

const TYPE_MASK: u32 = 0x0000_00FF;
const LIFECYCLE_SHIFT: u32 = 8;
const LIFECYCLE_MASK: u32 = 0x0000_0F00;
const METHODS_SHIFT: u32 = 12;
const METHODS_MASK: u32 = 0x0000_F000;
const CHANGE_SHIFT: u32 = 16;
const CHANGE_MASK: u32 = 0x0003_0000;
const OBSERVABLE_BIT: u32 = 1 << 18;
const PENDING_CHANGES_BIT: u32 = 1 << 19;

/// Packed per-instance state word.
///
/// All bookkeeping for a registry instance fits in one `u32`: the instance
/// type, its lifecycle, the accessor-table kind, the queued change state and
/// two flags. Every accessor reads or writes only its own masked bits.
///
/// # Example
///
/// ```
/// use canopy_binding::{
///     DataBindingInstanceState, DataBindingInstanceType, InstanceState, PropertyMethodsImplType,
/// };
///
/// let mut state = InstanceState::new(
///     DataBindingInstanceType::DependencyProperty,
///     PropertyMethodsImplType::DependencyProperty,
///     true,
/// );
/// assert!(state.is_observable());
/// assert_eq!(state.instance_state(), DataBindingInstanceState::Alive);
///
/// state.set_instance_state(DataBindingInstanceState::DestroyScheduled);
/// assert_eq!(
///     state.instance_type(),
///     DataBindingInstanceType::DependencyProperty
/// );
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct InstanceState(u32);

impl InstanceState {
    /// Creates the state word for a freshly created, alive instance.
    #[must_use]
    pub const fn new(
        instance_type: DataBindingInstanceType,
        methods_impl_type: PropertyMethodsImplType,
        observable: bool,
    ) -> Self {
        let mut bits = instance_type as u32;
        bits |= (methods_impl_type as u32) << METHODS_SHIFT;
        if observable {
            bits |= OBSERVABLE_BIT;
        }
        Self(bits)
    }

    /// Returns the instance type.
    #[must_use]
    pub const fn instance_type(self) -> DataBindingInstanceType {
        match self.0 & TYPE_MASK {
            0 => DataBindingInstanceType::DependencyObject,
            1 => DataBindingInstanceType::DataSourceObject,
            2 => DataBindingInstanceType::DependencyProperty,
            3 => DataBindingInstanceType::ReadOnlyDependencyProperty,
            4 => DataBindingInstanceType::DependencyObserverProperty,
            _ => unreachable!(),
        }
    }

    /// Returns `true` if the instance represents a property of any kind.
    #[must_use]
    pub const fn is_property(self) -> bool {
        matches!(
            self.instance_type(),
            DataBindingInstanceType::DependencyProperty
                | DataBindingInstanceType::ReadOnlyDependencyProperty
                | DataBindingInstanceType::DependencyObserverProperty
        )
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn instance_state(self) -> DataBindingInstanceState {
        match (self.0 & LIFECYCLE_MASK) >> LIFECYCLE_SHIFT {
            0 => DataBindingInstanceState::Alive,
            1 => DataBindingInstanceState::DestroyScheduled,
            2 => DataBindingInstanceState::Destroyed,
            _ => unreachable!(),
        }
    }

    /// Replaces the lifecycle state.
    pub const fn set_instance_state(&mut self, state: DataBindingInstanceState) {
        self.0 = (self.0 & !LIFECYCLE_MASK) | ((state as u32) << LIFECYCLE_SHIFT);
    }

    /// Returns `true` if the lifecycle state is [`DataBindingInstanceState::Alive`].
    #[must_use]
    pub const fn is_alive(self) -> bool {
        matches!(self.instance_state(), DataBindingInstanceState::Alive)
    }

    /// Returns the accessor-table kind.
    #[must_use]
    pub const fn methods_impl_type(self) -> PropertyMethodsImplType {
        match (self.0 & METHODS_MASK) >> METHODS_SHIFT {
            0 => PropertyMethodsImplType::NotAvailable,
            1 => PropertyMethodsImplType::DependencyProperty,
            2 => PropertyMethodsImplType::ReadOnlyDependencyProperty,
            3 => PropertyMethodsImplType::Observer,
            _ => unreachable!(),
        }
    }

    /// Returns the queued change state.
    #[must_use]
    pub const fn change_state(self) -> PropertyChangeState {
        match (self.0 & CHANGE_MASK) >> CHANGE_SHIFT {
            0 => PropertyChangeState::Unchanged,
            1 => PropertyChangeState::Refresh,
            2 => PropertyChangeState::Modified,
            _ => unreachable!(),
        }
    }

    /// Replaces the queued change state.
    pub const fn set_change_state(&mut self, state: PropertyChangeState) {
        self.0 = (self.0 & !CHANGE_MASK) | ((state as u32) << CHANGE_SHIFT);
    }

    /// Clears the queued change state back to [`PropertyChangeState::Unchanged`].
    pub const fn clear_change_state(&mut self) {
        self.0 &= !CHANGE_MASK;
    }

    /// Returns `true` if the instance participates in change notification.
    #[must_use]
    pub const fn is_observable(self) -> bool {
        (self.0 & OBSERVABLE_BIT) != 0
    }

    /// Returns `true` if the instance was marked during root determination
    /// and awaits execution this pass.
    #[must_use]
    pub const fn has_pending_changes(self) -> bool {
        (self.0 & PENDING_CHANGES_BIT) != 0
    }

    /// Sets the pending-changes flag.
    pub const fn mark_pending_changes(&mut self) {
        self.0 |= PENDING_CHANGES_BIT;
    }

    /// Clears the pending-changes flag.
    pub const fn clear_pending_changes(&mut self) {
        self.0 &= !PENDING_CHANGES_BIT;
    }
}

impl fmt::Debug for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceState")
            .field("instance_type", &self.instance_type())
            .field("instance_state", &self.instance_state())
            .field("methods_impl_type", &self.methods_impl_type())
            .field("change_state", &self.change_state())
            .field("observable", &self.is_observable())
            .field("pending_changes", &self.has_pending_changes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_alive_and_unchanged() {
        let state = InstanceState::new(
            DataBindingInstanceType::DependencyObject,
            PropertyMethodsImplType::NotAvailable,
            false,
        );
        assert_eq!(
            state.instance_type(),
            DataBindingInstanceType::DependencyObject
        );
        assert_eq!(state.instance_state(), DataBindingInstanceState::Alive);
        assert_eq!(
            state.methods_impl_type(),
            PropertyMethodsImplType::NotAvailable
        );
        assert_eq!(state.change_state(), PropertyChangeState::Unchanged);
        assert!(!state.is_observable());
        assert!(!state.has_pending_changes());
    }

    #[test]
    fn fields_do_not_bleed_into_each_other() {
        let mut state = InstanceState::new(
            DataBindingInstanceType::ReadOnlyDependencyProperty,
            PropertyMethodsImplType::ReadOnlyDependencyProperty,
            true,
        );

        state.set_instance_state(DataBindingInstanceState::DestroyScheduled);
        state.set_change_state(PropertyChangeState::Modified);
        state.mark_pending_changes();

        assert_eq!(
            state.instance_type(),
            DataBindingInstanceType::ReadOnlyDependencyProperty
        );
        assert_eq!(
            state.instance_state(),
            DataBindingInstanceState::DestroyScheduled
        );
        assert_eq!(
            state.methods_impl_type(),
            PropertyMethodsImplType::ReadOnlyDependencyProperty
        );
        assert_eq!(state.change_state(), PropertyChangeState::Modified);
        assert!(state.is_observable());
        assert!(state.has_pending_changes());

        state.clear_change_state();
        state.clear_pending_changes();
        assert_eq!(state.change_state(), PropertyChangeState::Unchanged);
        assert!(!state.has_pending_changes());
        assert!(state.is_observable());
        assert_eq!(
            state.instance_state(),
            DataBindingInstanceState::DestroyScheduled
        );
    }

    #[test]
    fn lifecycle_transitions() {
        let mut state = InstanceState::new(
            DataBindingInstanceType::DataSourceObject,
            PropertyMethodsImplType::NotAvailable,
            true,
        );
        assert!(state.is_alive());

        state.set_instance_state(DataBindingInstanceState::DestroyScheduled);
        assert!(!state.is_alive());

        state.set_instance_state(DataBindingInstanceState::Destroyed);
        assert_eq!(state.instance_state(), DataBindingInstanceState::Destroyed);
    }

    #[test]
    fn is_property_covers_property_kinds() {
        let object = InstanceState::new(
            DataBindingInstanceType::DependencyObject,
            PropertyMethodsImplType::NotAvailable,
            false,
        );
        assert!(!object.is_property());

        let property = InstanceState::new(
            DataBindingInstanceType::DependencyProperty,
            PropertyMethodsImplType::DependencyProperty,
            true,
        );
        assert!(property.is_property());

        let observer = InstanceState::new(
            DataBindingInstanceType::DependencyObserverProperty,
            PropertyMethodsImplType::Observer,
            false,
        );
        assert!(observer.is_property());
    }

    #[test]
    fn change_state_from_reason() {
        assert_eq!(
            PropertyChangeState::from(PropertyChangeReason::Refresh),
            PropertyChangeState::Refresh
        );
        assert_eq!(
            PropertyChangeState::from(PropertyChangeReason::Modified),
            PropertyChangeState::Modified
        );
    }
}
