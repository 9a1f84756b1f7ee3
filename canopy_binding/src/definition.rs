// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property definitions: the per-control-type identity of a property.

use alloc::rc::Rc;
use core::any::{Any, TypeId, type_name};
use core::fmt;
use core::marker::PhantomData;

/// Describes the accessor-table shape a definition expects.
///
/// Materializing a typed property checks the definition's descriptor against
/// the property's statically known value type, so a definition declared with
/// the wrong type parameter is caught once, up front, as a
/// [`DependencyPropertyDefinitionError`](crate::DependencyPropertyDefinitionError).
pub trait PropertyMethodsDefinition: 'static {
    /// The value type the accessor table will carry.
    fn value_type(&self) -> TypeId;
    /// Upcast for downcasting to the concrete descriptor.
    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn PropertyMethodsDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMethodsDefinition")
            .field("value_type", &self.value_type())
            .finish()
    }
}

/// Descriptor for a typed value property of type `T`.
pub struct TypedPropertyMethodsDefinition<T: 'static> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> TypedPropertyMethodsDefinition<T> {
    /// Creates the descriptor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> Default for TypedPropertyMethodsDefinition<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for TypedPropertyMethodsDefinition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedPropertyMethodsDefinition<{}>", type_name::<T>())
    }
}

impl<T: 'static> PropertyMethodsDefinition for TypedPropertyMethodsDefinition<T> {
    fn value_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Descriptor for an observer property (a callback slot with no value).
#[derive(Debug, Default)]
pub struct ObserverPropertyMethodsDefinition;

impl PropertyMethodsDefinition for ObserverPropertyMethodsDefinition {
    fn value_type(&self) -> TypeId {
        TypeId::of::<()>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The identity of a dependency property on a control type.
///
/// A definition is declared once per property per control type and shared by
/// every instance of that control. It carries the property name, the owning
/// control type, the value type and the accessor-table descriptor checked at
/// materialization. Cloning is cheap (the descriptor is shared).
///
/// Two definitions compare equal when owner type, name and value type agree.
///
/// # Example
///
/// ```
/// use canopy_binding::DependencyPropertyDefinition;
///
/// struct Slider;
///
/// let width = DependencyPropertyDefinition::create::<Slider, u32>("Width");
/// assert_eq!(width.name(), "Width");
/// assert_eq!(width, DependencyPropertyDefinition::create::<Slider, u32>("Width"));
/// assert_ne!(width, DependencyPropertyDefinition::create::<Slider, u32>("Height"));
/// ```
#[derive(Clone)]
pub struct DependencyPropertyDefinition {
    name: &'static str,
    owner_type: TypeId,
    value_type: TypeId,
    methods: Rc<dyn PropertyMethodsDefinition>,
}

impl DependencyPropertyDefinition {
    /// Declares a value property named `name` of type `T` on control type
    /// `TOwner`.
    #[must_use]
    pub fn create<TOwner: 'static, T: 'static>(name: &'static str) -> Self {
        Self {
            name,
            owner_type: TypeId::of::<TOwner>(),
            value_type: TypeId::of::<T>(),
            methods: Rc::new(TypedPropertyMethodsDefinition::<T>::new()),
        }
    }

    /// Declares an observer property named `name` on control type `TOwner`.
    #[must_use]
    pub fn create_observer<TOwner: 'static>(name: &'static str) -> Self {
        Self {
            name,
            owner_type: TypeId::of::<TOwner>(),
            value_type: TypeId::of::<()>(),
            methods: Rc::new(ObserverPropertyMethodsDefinition),
        }
    }

    /// The property name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The owning control type.
    #[must_use]
    pub fn owner_type(&self) -> TypeId {
        self.owner_type
    }

    /// The declared value type.
    #[must_use]
    pub fn value_type(&self) -> TypeId {
        self.value_type
    }

    /// The accessor-table descriptor.
    #[must_use]
    pub fn methods(&self) -> &dyn PropertyMethodsDefinition {
        &*self.methods
    }
}

impl PartialEq for DependencyPropertyDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.owner_type == other.owner_type
            && self.value_type == other.value_type
            && self.name == other.name
    }
}

impl Eq for DependencyPropertyDefinition {}

impl fmt::Debug for DependencyPropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyPropertyDefinition")
            .field("name", &self.name)
            .field("owner_type", &self.owner_type)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}
