// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Binding descriptions: source handles plus optional conversion.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::any::{TypeId, type_name};
use core::fmt;

use smallvec::SmallVec;

use crate::handle::DataBindingInstanceHandle;
use crate::value::ErasedValue;

/// Maximum number of sources a multi-source binding may take.
pub const MAX_MULTI_BIND_SOURCES: usize = 4;

/// Converts a single source value into a target value.
///
/// Implemented by [`ValueConverterBinding`]; the service checks the declared
/// source and target types at [`set_binding`](crate::DataBindingService::set_binding)
/// time, so `convert` only sees values of the declared source type.
pub trait ConverterBinding: 'static {
    /// The value type consumed.
    fn source_type(&self) -> TypeId;
    /// The value type produced.
    fn target_type(&self) -> TypeId;
    /// Produces the target value, or `None` if the source value is not of
    /// the declared type.
    fn convert(&self, source: &ErasedValue) -> Option<ErasedValue>;
}

/// Fuses several source values into one target value.
pub trait MultiConverterBinding: 'static {
    /// The value types consumed, in source order.
    fn source_types(&self) -> &[TypeId];
    /// The value type produced.
    fn target_type(&self) -> TypeId;
    /// Produces the target value, or `None` if any source value is not of
    /// its declared type.
    fn convert(&self, sources: &[ErasedValue]) -> Option<ErasedValue>;
}

/// A [`ConverterBinding`] backed by a closure.
///
/// # Example
///
/// ```
/// use canopy_binding::{ConverterBinding, ErasedValue, ValueConverterBinding};
///
/// let doubler = ValueConverterBinding::new(|width: &u32| width * 2);
/// let converted = doubler.convert(&ErasedValue::new(100_u32)).unwrap();
/// assert_eq!(converted.downcast_ref::<u32>(), Some(&200));
/// ```
pub struct ValueConverterBinding<S, T> {
    convert: Box<dyn Fn(&S) -> T>,
}

impl<S: Clone + 'static, T: Clone + 'static> ValueConverterBinding<S, T> {
    /// Creates a converter from the given conversion function.
    #[must_use]
    pub fn new(convert: impl Fn(&S) -> T + 'static) -> Self {
        Self {
            convert: Box::new(convert),
        }
    }
}

impl<S: Clone + 'static, T: Clone + 'static> ConverterBinding for ValueConverterBinding<S, T> {
    fn source_type(&self) -> TypeId {
        TypeId::of::<S>()
    }

    fn target_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn convert(&self, source: &ErasedValue) -> Option<ErasedValue> {
        let source = source.downcast_ref::<S>()?;
        Some(ErasedValue::new((self.convert)(source)))
    }
}

impl<S, T> fmt::Debug for ValueConverterBinding<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ValueConverterBinding<{}, {}>",
            type_name::<S>(),
            type_name::<T>()
        )
    }
}

/// A two-source [`MultiConverterBinding`] backed by a closure.
pub struct MultiConverterBinding2<S0, S1, T> {
    convert: Box<dyn Fn(&S0, &S1) -> T>,
    source_types: [TypeId; 2],
}

impl<S0: Clone + 'static, S1: Clone + 'static, T: Clone + 'static>
    MultiConverterBinding2<S0, S1, T>
{
    /// Creates a converter from the given fusion function.
    #[must_use]
    pub fn new(convert: impl Fn(&S0, &S1) -> T + 'static) -> Self {
        Self {
            convert: Box::new(convert),
            source_types: [TypeId::of::<S0>(), TypeId::of::<S1>()],
        }
    }
}

impl<S0: Clone + 'static, S1: Clone + 'static, T: Clone + 'static> MultiConverterBinding
    for MultiConverterBinding2<S0, S1, T>
{
    fn source_types(&self) -> &[TypeId] {
        &self.source_types
    }

    fn target_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn convert(&self, sources: &[ErasedValue]) -> Option<ErasedValue> {
        let [first, second] = sources else {
            return None;
        };
        let first = first.downcast_ref::<S0>()?;
        let second = second.downcast_ref::<S1>()?;
        Some(ErasedValue::new((self.convert)(first, second)))
    }
}

impl<S0, S1, T> fmt::Debug for MultiConverterBinding2<S0, S1, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MultiConverterBinding2<{}, {}, {}>",
            type_name::<S0>(),
            type_name::<S1>(),
            type_name::<T>()
        )
    }
}

/// The conversion attached to a binding, if any.
#[derive(Clone)]
pub enum ComplexBinding {
    /// Single-source conversion.
    Converter(Rc<dyn ConverterBinding>),
    /// Multi-source fusion.
    MultiConverter(Rc<dyn MultiConverterBinding>),
}

impl fmt::Debug for ComplexBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converter(_) => f.write_str("ComplexBinding::Converter"),
            Self::MultiConverter(_) => f.write_str("ComplexBinding::MultiConverter"),
        }
    }
}

/// Describes how a target property is fed from source properties.
///
/// A binding names 1..=[`MAX_MULTI_BIND_SOURCES`] source instances and
/// optionally a conversion. The default binding is empty and, when passed to
/// [`set_binding`](crate::DataBindingService::set_binding), clears whatever
/// binding the target currently has.
#[derive(Clone, Debug, Default)]
pub struct Binding {
    complex: Option<ComplexBinding>,
    sources: SmallVec<[DataBindingInstanceHandle; MAX_MULTI_BIND_SOURCES]>,
}

impl Binding {
    /// A direct binding: the source value is copied to the target.
    #[must_use]
    pub fn new(source: DataBindingInstanceHandle) -> Self {
        Self {
            complex: None,
            sources: SmallVec::from_slice(&[source]),
        }
    }

    /// A converting binding over a single source.
    #[must_use]
    pub fn with_converter(
        converter: Rc<dyn ConverterBinding>,
        source: DataBindingInstanceHandle,
    ) -> Self {
        Self {
            complex: Some(ComplexBinding::Converter(converter)),
            sources: SmallVec::from_slice(&[source]),
        }
    }

    /// A fusing binding over several sources, in the converter's declared
    /// order.
    #[must_use]
    pub fn with_multi_converter(
        converter: Rc<dyn MultiConverterBinding>,
        sources: &[DataBindingInstanceHandle],
    ) -> Self {
        Self {
            complex: Some(ComplexBinding::MultiConverter(converter)),
            sources: SmallVec::from_slice(sources),
        }
    }

    /// The source handles, in order.
    #[must_use]
    pub fn source_handles(&self) -> &[DataBindingInstanceHandle] {
        &self.sources
    }

    /// The attached conversion, if any.
    #[must_use]
    pub fn complex_binding(&self) -> Option<&ComplexBinding> {
        self.complex.as_ref()
    }

    /// Returns `true` if there is at least one source and every source
    /// handle is valid.
    ///
    /// Bindings that fail this check are treated as "no binding": setting
    /// them on a never-materialized property is a no-op.
    #[must_use]
    pub fn has_valid_source_handles(&self) -> bool {
        !self.sources.is_empty()
            && self
                .sources
                .iter()
                .all(|handle| handle.is_valid())
    }

    /// Returns `true` if `handle` is one of the sources.
    #[must_use]
    pub fn contains_source(&self, handle: DataBindingInstanceHandle) -> bool {
        self.sources.contains(&handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binding_is_empty() {
        let binding = Binding::default();
        assert!(!binding.has_valid_source_handles());
        assert!(binding.source_handles().is_empty());
        assert!(binding.complex_binding().is_none());
    }

    #[test]
    fn binding_with_invalid_source_is_not_valid() {
        let binding = Binding::new(DataBindingInstanceHandle::INVALID);
        assert!(!binding.has_valid_source_handles());
    }

    #[test]
    fn binding_with_valid_source() {
        let source = DataBindingInstanceHandle::new(0, 1);
        let binding = Binding::new(source);
        assert!(binding.has_valid_source_handles());
        assert!(binding.contains_source(source));
        assert!(!binding.contains_source(DataBindingInstanceHandle::new(1, 1)));
    }

    #[test]
    fn converter_declares_its_types() {
        let converter = ValueConverterBinding::new(|value: &u32| u64::from(*value));
        assert_eq!(converter.source_type(), TypeId::of::<u32>());
        assert_eq!(converter.target_type(), TypeId::of::<u64>());

        let converted = converter.convert(&ErasedValue::new(10_u32)).unwrap();
        assert_eq!(converted.downcast_ref::<u64>(), Some(&10));

        assert!(converter.convert(&ErasedValue::new(10_i64)).is_none());
    }

    #[test]
    fn multi_converter_fuses_two_sources() {
        let converter = MultiConverterBinding2::new(|a: &u32, b: &u32| a + b);
        assert_eq!(
            converter.source_types(),
            &[TypeId::of::<u32>(), TypeId::of::<u32>()]
        );

        let fused = converter
            .convert(&[ErasedValue::new(2_u32), ErasedValue::new(3_u32)])
            .unwrap();
        assert_eq!(fused.downcast_ref::<u32>(), Some(&5));

        // Wrong arity.
        assert!(converter.convert(&[ErasedValue::new(2_u32)]).is_none());
    }
}
