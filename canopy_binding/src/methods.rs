// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-erased accessor tables bound to live property instances.
//!
//! When a property materializes, its value moves into a shared cell and an
//! accessor table over that cell is handed to the
//! [`DataBindingService`](crate::DataBindingService). The propagation pass
//! reads and writes property values exclusively through these tables, so a
//! binding-driven write lands directly in the storage the owning control
//! reads.

use alloc::rc::Rc;
use core::any::{TypeId, type_name};
use core::cell::RefCell;
use core::fmt;

use crate::handle::DataBindingInstanceHandle;
use crate::state::PropertyMethodsImplType;
use crate::value::ErasedValue;

/// Outcome of pushing a value into an accessor table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PropertySetResult {
    /// The incoming value equals the stored value; nothing was written.
    ValueUnchanged,
    /// The stored value was replaced.
    ValueChanged,
    /// The incoming value was not of the table's value type.
    UnsupportedValueType,
    /// The table does not accept writes (read-only or observer).
    NotSupported,
}

impl PropertySetResult {
    /// Returns `true` if the stored value was replaced.
    #[must_use]
    pub const fn value_changed(self) -> bool {
        matches!(self, Self::ValueChanged)
    }
}

/// The accessor table for one live property instance.
///
/// Implementations capture a strongly-typed shared cell at materialization
/// time; the type check happens once, against the property definition, not
/// on every access.
pub trait PropertyMethods: 'static {
    /// The value type this table carries.
    fn value_type(&self) -> TypeId;

    /// The table kind, recorded in the instance state word.
    fn impl_type(&self) -> PropertyMethodsImplType;

    /// Returns `true` if the table rejects binding-driven writes.
    fn is_read_only(&self) -> bool {
        false
    }

    /// Clones the current value out through the erasure boundary.
    fn get_erased(&self) -> ErasedValue;

    /// Pushes a value in through the erasure boundary.
    fn try_set_erased(&self, value: ErasedValue) -> PropertySetResult;

    /// Copies the peer's current value into this table.
    fn try_set_from(&self, source: &dyn PropertyMethods) -> PropertySetResult {
        if source.value_type() != self.value_type() {
            return PropertySetResult::UnsupportedValueType;
        }
        self.try_set_erased(source.get_erased())
    }

    /// Invokes the observer callback, if this is an observer table.
    fn try_invoke(&self, source: DataBindingInstanceHandle) -> bool {
        let _ = source;
        false
    }
}

impl fmt::Debug for dyn PropertyMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMethods")
            .field("impl_type", &self.impl_type())
            .field("value_type", &self.value_type())
            .finish()
    }
}

/// Read-write accessor table over a shared typed cell.
pub struct TypedPropertyMethods<T: Clone + PartialEq + 'static> {
    cell: Rc<RefCell<T>>,
}

impl<T: Clone + PartialEq + 'static> TypedPropertyMethods<T> {
    /// Creates a table over the given cell.
    #[must_use]
    pub fn new(cell: Rc<RefCell<T>>) -> Self {
        Self { cell }
    }

    /// Clones the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.cell.borrow().clone()
    }

    /// Stores `value`, reporting whether anything changed.
    pub fn set(&self, value: T) -> PropertySetResult {
        let mut current = self.cell.borrow_mut();
        if *current == value {
            PropertySetResult::ValueUnchanged
        } else {
            *current = value;
            PropertySetResult::ValueChanged
        }
    }
}

impl<T: Clone + PartialEq + 'static> PropertyMethods for TypedPropertyMethods<T> {
    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn impl_type(&self) -> PropertyMethodsImplType {
        PropertyMethodsImplType::DependencyProperty
    }

    fn get_erased(&self) -> ErasedValue {
        ErasedValue::new(self.get())
    }

    fn try_set_erased(&self, value: ErasedValue) -> PropertySetResult {
        match value.try_take::<T>() {
            Ok(value) => self.set(value),
            Err(_) => PropertySetResult::UnsupportedValueType,
        }
    }
}

impl<T: Clone + PartialEq + 'static> fmt::Debug for TypedPropertyMethods<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedPropertyMethods<{}>", type_name::<T>())
    }
}

/// Source-only accessor table over a shared typed cell.
///
/// Used for properties a control exposes for others to bind to but drives
/// itself. Binding-driven writes are rejected.
pub struct ReadOnlyPropertyMethods<T: Clone + PartialEq + 'static> {
    cell: Rc<RefCell<T>>,
}

impl<T: Clone + PartialEq + 'static> ReadOnlyPropertyMethods<T> {
    /// Creates a table over the given cell.
    #[must_use]
    pub fn new(cell: Rc<RefCell<T>>) -> Self {
        Self { cell }
    }

    /// Clones the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.cell.borrow().clone()
    }
}

impl<T: Clone + PartialEq + 'static> PropertyMethods for ReadOnlyPropertyMethods<T> {
    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn impl_type(&self) -> PropertyMethodsImplType {
        PropertyMethodsImplType::ReadOnlyDependencyProperty
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn get_erased(&self) -> ErasedValue {
        ErasedValue::new(self.get())
    }

    fn try_set_erased(&self, _value: ErasedValue) -> PropertySetResult {
        PropertySetResult::NotSupported
    }
}

impl<T: Clone + PartialEq + 'static> fmt::Debug for ReadOnlyPropertyMethods<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReadOnlyPropertyMethods<{}>", type_name::<T>())
    }
}

/// Callback invoker for observer properties.
///
/// Carries no value; the propagation pass calls [`PropertyMethods::try_invoke`]
/// with the handle of the source that changed.
pub struct ObserverPropertyMethods {
    callback: Rc<dyn Fn(DataBindingInstanceHandle)>,
}

impl ObserverPropertyMethods {
    /// Creates an invoker around the given callback.
    #[must_use]
    pub fn new(callback: Rc<dyn Fn(DataBindingInstanceHandle)>) -> Self {
        Self { callback }
    }
}

impl PropertyMethods for ObserverPropertyMethods {
    fn value_type(&self) -> TypeId {
        TypeId::of::<()>()
    }

    fn impl_type(&self) -> PropertyMethodsImplType {
        PropertyMethodsImplType::Observer
    }

    fn is_read_only(&self) -> bool {
        true
    }

    fn get_erased(&self) -> ErasedValue {
        ErasedValue::new(())
    }

    fn try_set_erased(&self, _value: ErasedValue) -> PropertySetResult {
        PropertySetResult::NotSupported
    }

    fn try_invoke(&self, source: DataBindingInstanceHandle) -> bool {
        (self.callback)(source);
        true
    }
}

impl fmt::Debug for ObserverPropertyMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ObserverPropertyMethods")
    }
}
