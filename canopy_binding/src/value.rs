// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Value transport between accessor tables and converters.
//!
//! During a propagation pass a property value crosses type-erasure
//! boundaries: out of a source's accessor table and, when a converter sits
//! on the binding, through the converter into the target's table.
//! [`ErasedValue`] is the boxed payload carried across those boundaries. The
//! receiving side recovers the concrete type by reference
//! ([`downcast_ref`](ErasedValue::downcast_ref)) to inspect it, or by move
//! ([`try_take`](ErasedValue::try_take)) to store it without another clone.

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

/// A property value in transit between accessor tables.
///
/// Carries any `Clone + 'static` value, boxed together with enough vtable to
/// clone it for fan-out and to recover the concrete type on arrival.
///
/// # Example
///
/// ```
/// use canopy_binding::ErasedValue;
///
/// let value = ErasedValue::new(42_u32);
/// assert!(value.is::<u32>());
/// assert_eq!(value.downcast_ref::<u32>(), Some(&42));
/// assert_eq!(value.try_take::<u32>().ok(), Some(42));
/// ```
pub struct ErasedValue {
    payload: Box<dyn TransportPayload>,
}

impl ErasedValue {
    /// Boxes `value` for transport.
    #[must_use]
    pub fn new<T: Clone + 'static>(value: T) -> Self {
        Self {
            payload: Box::new(value),
        }
    }

    /// The [`TypeId`] of the carried value.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.payload.as_any().type_id()
    }

    /// Returns `true` if the carried value is a `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.payload.as_any().is::<T>()
    }

    /// Borrows the carried value as a `T`, or `None` if it carries some
    /// other type.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.payload.as_any().downcast_ref()
    }

    /// Moves the carried value out as a `T`.
    ///
    /// # Errors
    ///
    /// Hands the value back untouched if it carries some other type.
    pub fn try_take<T: 'static>(self) -> Result<T, Self> {
        if !self.is::<T>() {
            return Err(self);
        }
        match self.payload.into_any().downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(_) => unreachable!(),
        }
    }
}

impl Clone for ErasedValue {
    fn clone(&self) -> Self {
        Self {
            payload: self.payload.clone_boxed(),
        }
    }
}

impl fmt::Debug for ErasedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedValue")
            .field("type_id", &self.type_id())
            .finish_non_exhaustive()
    }
}

/// The vtable riding along with the boxed value: `Any` access by reference
/// and by move, plus cloning for fan-out to several targets.
trait TransportPayload {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_boxed(&self) -> Box<dyn TransportPayload>;
}

impl<T: Clone + 'static> TransportPayload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_boxed(&self) -> Box<dyn TransportPayload> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::{PropertyMethods, PropertySetResult, TypedPropertyMethods};
    use alloc::rc::Rc;
    use alloc::string::String;
    use core::cell::RefCell;

    #[test]
    fn carried_value_lands_in_a_typed_cell() {
        let cell = Rc::new(RefCell::new(0_u32));
        let table = TypedPropertyMethods::new(cell.clone());

        assert_eq!(
            table.try_set_erased(ErasedValue::new(7_u32)),
            PropertySetResult::ValueChanged
        );
        assert_eq!(*cell.borrow(), 7);
        assert_eq!(
            table.try_set_erased(ErasedValue::new(7_u32)),
            PropertySetResult::ValueUnchanged
        );
    }

    #[test]
    fn mistyped_value_is_handed_back() {
        let value = ErasedValue::new(7_u32);
        assert!(!value.is::<i32>());
        let back = value.try_take::<i32>().unwrap_err();
        assert_eq!(back.downcast_ref::<u32>(), Some(&7));

        let cell = Rc::new(RefCell::new(0.0_f32));
        let table = TypedPropertyMethods::new(cell.clone());
        assert_eq!(
            table.try_set_erased(back),
            PropertySetResult::UnsupportedValueType
        );
        assert_eq!(*cell.borrow(), 0.0);
    }

    #[test]
    fn fan_out_clones_the_payload() {
        let value = ErasedValue::new(String::from("caption"));
        let for_second_target = value.clone();

        assert_eq!(value.try_take::<String>().ok().as_deref(), Some("caption"));
        assert_eq!(
            for_second_target.try_take::<String>().ok().as_deref(),
            Some("caption")
        );
    }

    #[test]
    fn transport_reports_the_carried_type() {
        let value = ErasedValue::new(1_u8);
        assert_eq!(value.type_id(), TypeId::of::<u8>());
        assert_eq!(value.downcast_ref::<u8>(), Some(&1));
        assert_eq!(value.downcast_ref::<u16>(), None);
    }
}
