// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reflection over a control's bindable properties.
//!
//! Controls that expose their properties by definition (rather than by typed
//! accessors) implement [`DependencyObject`]: a tooling layer or a binding
//! loader can then look up handles, attach bindings and enumerate properties
//! without knowing the control's concrete type. The [`PropLink`] helpers do
//! the matching so implementations stay declarative: list the definition /
//! property pairs and forward.

use alloc::vec::Vec;

use crate::binding::Binding;
use crate::definition::DependencyPropertyDefinition;
use crate::error::BindingError;
use crate::handle::DataBindingInstanceHandle;
use crate::property::{
    DependencyObserverProperty, StringDependencyProperty, TypedDependencyProperty,
    TypedReadOnlyDependencyProperty,
};
use crate::scope::ScopedDependencyObject;

/// Outcome of a by-definition binding attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PropertySetBindingResult {
    /// The control has no property matching the definition.
    NotFound,
    /// The property was found; the binding was already attached.
    Unchanged,
    /// The property was found and the binding attached.
    Changed,
}

/// A control whose bindable properties can be reached by definition.
pub trait DependencyObject {
    /// Resolves the property matching `definition` to its instance handle,
    /// materializing it on demand. Returns the invalid handle if the control
    /// has no such property.
    ///
    /// # Errors
    ///
    /// Materialization errors, see
    /// [`BindingError::Definition`].
    fn try_get_property_handle_now(
        &mut self,
        definition: &DependencyPropertyDefinition,
    ) -> Result<DataBindingInstanceHandle, BindingError>;

    /// Attaches `binding` to the property matching `definition`.
    ///
    /// # Errors
    ///
    /// See [`DataBindingService::set_binding`](crate::DataBindingService::set_binding).
    fn try_set_binding_now(
        &mut self,
        definition: &DependencyPropertyDefinition,
        binding: &Binding,
    ) -> Result<PropertySetBindingResult, BindingError>;

    /// Appends the definitions of all bindable properties to `out`.
    fn extract_all_properties(&self, out: &mut Vec<DependencyPropertyDefinition>);

    /// Like [`try_set_binding_now`](Self::try_set_binding_now), but an
    /// unknown definition is an error.
    ///
    /// # Errors
    ///
    /// [`BindingError::NotFound`] if no property matches, plus everything
    /// `try_set_binding_now` reports.
    fn set_binding_now(
        &mut self,
        definition: &DependencyPropertyDefinition,
        binding: &Binding,
    ) -> Result<bool, BindingError> {
        match self.try_set_binding_now(definition, binding)? {
            PropertySetBindingResult::NotFound => Err(BindingError::NotFound),
            PropertySetBindingResult::Unchanged => Ok(false),
            PropertySetBindingResult::Changed => Ok(true),
        }
    }
}

/// Pairs a property definition with the control's property cell.
#[derive(Debug)]
pub struct PropLink<'a, P> {
    definition: &'a DependencyPropertyDefinition,
    property: &'a mut P,
}

impl<'a, P> PropLink<'a, P> {
    /// Links `definition` to `property` for the duration of one call.
    pub fn new(definition: &'a DependencyPropertyDefinition, property: &'a mut P) -> Self {
        Self {
            definition,
            property,
        }
    }
}

/// Object-safe view of a linked property, so heterogeneous property lists
/// can be walked uniformly.
pub trait LinkableProperty {
    /// The linked definition.
    fn definition(&self) -> &DependencyPropertyDefinition;

    /// Materializes the property and returns its handle.
    ///
    /// # Errors
    ///
    /// See [`BindingError::Definition`].
    fn instance_handle_on_demand(
        &mut self,
        scope: &ScopedDependencyObject,
    ) -> Result<DataBindingInstanceHandle, BindingError>;

    /// Attaches a binding to the property.
    ///
    /// # Errors
    ///
    /// See [`DataBindingService::set_binding`](crate::DataBindingService::set_binding).
    fn set_binding(
        &mut self,
        scope: &ScopedDependencyObject,
        binding: &Binding,
    ) -> Result<bool, BindingError>;
}

impl<T: Clone + PartialEq + 'static> LinkableProperty for PropLink<'_, TypedDependencyProperty<T>> {
    fn definition(&self) -> &DependencyPropertyDefinition {
        self.definition
    }

    fn instance_handle_on_demand(
        &mut self,
        scope: &ScopedDependencyObject,
    ) -> Result<DataBindingInstanceHandle, BindingError> {
        self.property.get_instance_handle_on_demand(scope, self.definition)
    }

    fn set_binding(
        &mut self,
        scope: &ScopedDependencyObject,
        binding: &Binding,
    ) -> Result<bool, BindingError> {
        self.property.set_binding(scope, self.definition, binding)
    }
}

impl<T: Clone + PartialEq + 'static> LinkableProperty
    for PropLink<'_, TypedReadOnlyDependencyProperty<T>>
{
    fn definition(&self) -> &DependencyPropertyDefinition {
        self.definition
    }

    fn instance_handle_on_demand(
        &mut self,
        scope: &ScopedDependencyObject,
    ) -> Result<DataBindingInstanceHandle, BindingError> {
        self.property.get_instance_handle_on_demand(scope, self.definition)
    }

    fn set_binding(
        &mut self,
        _scope: &ScopedDependencyObject,
        _binding: &Binding,
    ) -> Result<bool, BindingError> {
        // Source-only; nothing can feed it.
        Err(BindingError::IncompatibleProperties)
    }
}

impl LinkableProperty for PropLink<'_, StringDependencyProperty> {
    fn definition(&self) -> &DependencyPropertyDefinition {
        self.definition
    }

    fn instance_handle_on_demand(
        &mut self,
        scope: &ScopedDependencyObject,
    ) -> Result<DataBindingInstanceHandle, BindingError> {
        self.property.get_instance_handle_on_demand(scope, self.definition)
    }

    fn set_binding(
        &mut self,
        scope: &ScopedDependencyObject,
        binding: &Binding,
    ) -> Result<bool, BindingError> {
        self.property.set_binding(scope, self.definition, binding)
    }
}

impl LinkableProperty for PropLink<'_, DependencyObserverProperty> {
    fn definition(&self) -> &DependencyPropertyDefinition {
        self.definition
    }

    fn instance_handle_on_demand(
        &mut self,
        scope: &ScopedDependencyObject,
    ) -> Result<DataBindingInstanceHandle, BindingError> {
        self.property.get_instance_handle_on_demand(scope, self.definition)
    }

    fn set_binding(
        &mut self,
        scope: &ScopedDependencyObject,
        binding: &Binding,
    ) -> Result<bool, BindingError> {
        self.property.set_binding(scope, self.definition, binding)
    }
}

/// Walks `links` for the property matching `definition` and resolves its
/// handle, materializing on demand. Returns the invalid handle when nothing
/// matches.
///
/// # Errors
///
/// Materialization errors from the matching link.
pub fn try_get_property_handle(
    scope: &ScopedDependencyObject,
    definition: &DependencyPropertyDefinition,
    links: &mut [&mut dyn LinkableProperty],
) -> Result<DataBindingInstanceHandle, BindingError> {
    for link in links {
        if link.definition() == definition {
            return link.instance_handle_on_demand(scope);
        }
    }
    Ok(DataBindingInstanceHandle::INVALID)
}

/// Walks `links` for the property matching `definition` and attaches
/// `binding` to it.
///
/// # Errors
///
/// Binding errors from the matching link.
pub fn try_set_binding(
    scope: &ScopedDependencyObject,
    definition: &DependencyPropertyDefinition,
    binding: &Binding,
    links: &mut [&mut dyn LinkableProperty],
) -> Result<PropertySetBindingResult, BindingError> {
    for link in links {
        if link.definition() == definition {
            let changed = link.set_binding(scope, binding)?;
            return Ok(if changed {
                PropertySetBindingResult::Changed
            } else {
                PropertySetBindingResult::Unchanged
            });
        }
    }
    Ok(PropertySetBindingResult::NotFound)
}

/// Appends `definitions` to `out`, the shape
/// [`DependencyObject::extract_all_properties`] expects.
pub fn extract_all_properties(
    out: &mut Vec<DependencyPropertyDefinition>,
    definitions: &[&DependencyPropertyDefinition],
) {
    out.extend(definitions.iter().map(|definition| (*definition).clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::DataBindingService;
    use crate::state::PropertyChangeReason;
    use alloc::rc::Rc;
    use alloc::string::String;
    use core::cell::RefCell;

    struct Slider;

    struct SliderControl {
        scope: ScopedDependencyObject,
        value_def: DependencyPropertyDefinition,
        label_def: DependencyPropertyDefinition,
        value: TypedDependencyProperty<u32>,
        label: StringDependencyProperty,
    }

    impl SliderControl {
        fn new(service: Rc<RefCell<DataBindingService>>) -> Self {
            Self {
                scope: ScopedDependencyObject::new(service),
                value_def: DependencyPropertyDefinition::create::<Slider, u32>("Value"),
                label_def: DependencyPropertyDefinition::create::<Slider, String>("Label"),
                value: TypedDependencyProperty::new(0),
                label: StringDependencyProperty::default(),
            }
        }
    }

    impl DependencyObject for SliderControl {
        fn try_get_property_handle_now(
            &mut self,
            definition: &DependencyPropertyDefinition,
        ) -> Result<DataBindingInstanceHandle, BindingError> {
            try_get_property_handle(
                &self.scope,
                definition,
                &mut [
                    &mut PropLink::new(&self.value_def, &mut self.value),
                    &mut PropLink::new(&self.label_def, &mut self.label),
                ],
            )
        }

        fn try_set_binding_now(
            &mut self,
            definition: &DependencyPropertyDefinition,
            binding: &Binding,
        ) -> Result<PropertySetBindingResult, BindingError> {
            try_set_binding(
                &self.scope,
                definition,
                binding,
                &mut [
                    &mut PropLink::new(&self.value_def, &mut self.value),
                    &mut PropLink::new(&self.label_def, &mut self.label),
                ],
            )
        }

        fn extract_all_properties(&self, out: &mut Vec<DependencyPropertyDefinition>) {
            extract_all_properties(out, &[&self.value_def, &self.label_def]);
        }
    }

    fn shared_service() -> Rc<RefCell<DataBindingService>> {
        Rc::new(RefCell::new(DataBindingService::new()))
    }

    #[test]
    fn lookup_by_definition_materializes_the_property() {
        let service = shared_service();
        let mut control = SliderControl::new(service.clone());

        let request = DependencyPropertyDefinition::create::<Slider, u32>("Value");
        let handle = control.try_get_property_handle_now(&request).unwrap();
        assert!(handle.is_valid());
        assert!(control.value.is_instance(handle));

        // Unknown definitions resolve to the invalid handle.
        let unknown = DependencyPropertyDefinition::create::<Slider, u32>("Elevation");
        let missing = control.try_get_property_handle_now(&unknown).unwrap();
        assert!(!missing.is_valid());
    }

    #[test]
    fn bind_two_controls_by_definition() {
        let service = shared_service();
        let mut a = SliderControl::new(service.clone());
        let mut b = SliderControl::new(service.clone());

        let value_def = DependencyPropertyDefinition::create::<Slider, u32>("Value");
        let source = a.try_get_property_handle_now(&value_def).unwrap();
        let result = b
            .try_set_binding_now(&value_def, &Binding::new(source))
            .unwrap();
        assert_eq!(result, PropertySetBindingResult::Changed);

        assert!(a.value.set(&a.scope, 55, PropertyChangeReason::Modified));
        service.borrow_mut().execute_changes();
        assert_eq!(b.value.get(), 55);

        // Same binding again reports no change.
        let result = b
            .try_set_binding_now(&value_def, &Binding::new(source))
            .unwrap();
        assert_eq!(result, PropertySetBindingResult::Unchanged);
    }

    #[test]
    fn strict_binding_to_unknown_definition_errors() {
        let service = shared_service();
        let mut a = SliderControl::new(service.clone());
        let mut b = SliderControl::new(service);

        let value_def = DependencyPropertyDefinition::create::<Slider, u32>("Value");
        let unknown = DependencyPropertyDefinition::create::<Slider, u32>("Elevation");
        let source = a.try_get_property_handle_now(&value_def).unwrap();

        assert_eq!(
            b.try_set_binding_now(&unknown, &Binding::new(source)),
            Ok(PropertySetBindingResult::NotFound)
        );
        assert_eq!(
            b.set_binding_now(&unknown, &Binding::new(source)),
            Err(BindingError::NotFound)
        );
    }

    #[test]
    fn extract_lists_every_definition() {
        let service = shared_service();
        let control = SliderControl::new(service);

        let mut definitions = Vec::new();
        control.extract_all_properties(&mut definitions);
        assert_eq!(definitions.len(), 2);
        assert_eq!(definitions[0].name(), "Value");
        assert_eq!(definitions[1].name(), "Label");
    }
}
