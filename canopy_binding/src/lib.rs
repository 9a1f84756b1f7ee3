// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Canopy Binding: a dependency-property data-binding engine for
//! retained-mode UI toolkits.
//!
//! Controls declare typed, observable properties once per control type
//! ([`DependencyPropertyDefinition`]) and embed cheap inline cells per
//! instance ([`TypedDependencyProperty`]). Properties stay invisible to the
//! engine until something observes them; at that point they materialize into
//! a shared [`DataBindingService`], which owns the binding graph and
//! resolves it once per frame:
//!
//! - **Bindings** ([`Binding`]): one-way source → target links, optionally
//!   through a converter ([`ValueConverterBinding`]) or a multi-source
//!   fusion ([`MultiConverterBinding2`]).
//! - **Propagation** ([`DataBindingService::execute_changes`]): changes
//!   reported during the frame are pushed through the graph in dependency
//!   order, a target resolving only after all of its sources settled.
//!   Cycles are rejected when a binding is attached, never discovered
//!   mid-pass.
//! - **Ownership** ([`ScopedDependencyObject`]): each control owns its
//!   registry instances through an RAII scope; dropping the control
//!   invalidates every handle it issued.
//! - **Observers** ([`DependencyObserverProperty`],
//!   [`ScopedDataSourceObject`]): callback slots bound to model objects that
//!   report wholesale changes.
//! - **Reflection** ([`DependencyObject`]): by-definition property lookup,
//!   binding and enumeration for tooling and binding loaders.
//!
//! ## Quick Start
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use canopy_binding::{
//!     Binding, DataBindingService, DependencyPropertyDefinition, PropertyChangeReason,
//!     ScopedDependencyObject, TypedDependencyProperty, ValueConverterBinding,
//! };
//!
//! struct Window;
//!
//! let service = Rc::new(RefCell::new(DataBindingService::new()));
//! let scope = ScopedDependencyObject::new(service.clone());
//!
//! let width_def = DependencyPropertyDefinition::create::<Window, u32>("Width");
//! let height_def = DependencyPropertyDefinition::create::<Window, u32>("Height");
//!
//! // Unobserved properties are plain values; the service holds nothing.
//! let mut width = TypedDependencyProperty::new(100_u32);
//! let mut height = TypedDependencyProperty::new(0_u32);
//! width.set(&scope, 200, PropertyChangeReason::Modified);
//!
//! // Bind height = width * 2. Both properties materialize on demand.
//! let width_handle = width.get_instance_handle_on_demand(&scope, &width_def).unwrap();
//! let doubler = Rc::new(ValueConverterBinding::new(|width: &u32| width * 2));
//! height
//!     .set_binding(&scope, &height_def, &Binding::with_converter(doubler, width_handle))
//!     .unwrap();
//!
//! // Once per frame.
//! service.borrow_mut().execute_changes();
//! assert_eq!(height.get(), 400);
//! ```
//!
//! ## Concurrency
//!
//! The engine is single-threaded and frame-driven. Controls share the
//! service through `Rc<RefCell<_>>`; observer callbacks run at the end of
//! the propagation pass and must not call back into the service.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod binding;
mod definition;
mod error;
mod handle;
mod methods;
mod object;
mod property;
mod scope;
mod service;
mod slots;
mod state;
mod value;

pub use binding::{
    Binding, ComplexBinding, ConverterBinding, MAX_MULTI_BIND_SOURCES, MultiConverterBinding,
    MultiConverterBinding2, ValueConverterBinding,
};
pub use definition::{
    DependencyPropertyDefinition, ObserverPropertyMethodsDefinition, PropertyMethodsDefinition,
    TypedPropertyMethodsDefinition,
};
pub use error::{BindingError, DependencyPropertyDefinitionError};
pub use handle::DataBindingInstanceHandle;
pub use methods::{
    ObserverPropertyMethods, PropertyMethods, PropertySetResult, ReadOnlyPropertyMethods,
    TypedPropertyMethods,
};
pub use object::{
    DependencyObject, LinkableProperty, PropLink, PropertySetBindingResult,
    extract_all_properties, try_get_property_handle, try_set_binding,
};
pub use property::{
    DependencyObserverProperty, StrRef, StringDependencyProperty, TypedDependencyProperty,
    TypedReadOnlyDependencyProperty,
};
pub use scope::{ScopedDataSourceObject, ScopedDependencyObject};
pub use service::DataBindingService;
pub use state::{
    DataBindingInstanceState, DataBindingInstanceType, InstanceState, PropertyChangeReason,
    PropertyChangeState, PropertyMethodsImplType,
};
pub use value::ErasedValue;
