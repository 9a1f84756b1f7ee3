// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! RAII owners tying controls and data sources to the binding service.

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::binding::Binding;
use crate::definition::DependencyPropertyDefinition;
use crate::error::BindingError;
use crate::handle::DataBindingInstanceHandle;
use crate::methods::PropertyMethods;
use crate::service::DataBindingService;
use crate::state::PropertyChangeReason;

/// Owns a control's dependency-object instance in the binding service.
///
/// Each control embeds one scope. The underlying instance is created lazily,
/// the first time a property of the control materializes, so a control whose
/// properties are never observed costs the service nothing. Dropping the
/// scope destroys the instance and every property instance created through
/// it, on all exit paths.
pub struct ScopedDependencyObject {
    service: Rc<RefCell<DataBindingService>>,
    handle: Cell<DataBindingInstanceHandle>,
}

impl ScopedDependencyObject {
    /// Creates a scope for one control. No service instance is registered
    /// yet.
    #[must_use]
    pub fn new(service: Rc<RefCell<DataBindingService>>) -> Self {
        Self {
            service,
            handle: Cell::new(DataBindingInstanceHandle::INVALID),
        }
    }

    /// The owning instance handle, or the invalid handle if nothing has
    /// materialized yet.
    #[must_use]
    pub fn instance_handle(&self) -> DataBindingInstanceHandle {
        self.handle.get()
    }

    /// The owning instance handle, registering the instance on first use.
    pub fn instance_handle_on_demand(&self) -> DataBindingInstanceHandle {
        let current = self.handle.get();
        if current.is_valid() {
            return current;
        }
        let handle = self.service.borrow_mut().create_dependency_object();
        self.handle.set(handle);
        handle
    }

    /// Registers a property instance under this control.
    ///
    /// # Errors
    ///
    /// Propagates the service's creation errors, most notably
    /// [`BindingError::Definition`] when the accessor table does not match
    /// the definition.
    pub fn create_property(
        &self,
        definition: &DependencyPropertyDefinition,
        methods: Rc<dyn PropertyMethods>,
    ) -> Result<DataBindingInstanceHandle, BindingError> {
        let owner = self.instance_handle_on_demand();
        self.service
            .borrow_mut()
            .create_dependency_object_property(owner, definition, methods)
    }

    /// Gate for control-driven writes to a materialized property.
    ///
    /// Returns `true` if the write may proceed: the property must not be fed
    /// by a binding, and the change is then queued for the next pass.
    pub fn property_changed(
        &self,
        handle: DataBindingInstanceHandle,
        reason: PropertyChangeReason,
    ) -> bool {
        let mut service = self.service.borrow_mut();
        !service.is_property_read_only(handle) && service.changed(handle, reason)
    }

    /// Returns `true` if a binding currently feeds the property.
    #[must_use]
    pub fn is_property_read_only(&self, handle: DataBindingInstanceHandle) -> bool {
        self.service.borrow().is_property_read_only(handle)
    }

    /// Attaches a binding to a property of this control.
    ///
    /// # Errors
    ///
    /// See [`DataBindingService::set_binding`].
    pub fn set_binding(
        &self,
        target: DataBindingInstanceHandle,
        binding: &Binding,
    ) -> Result<bool, BindingError> {
        self.service.borrow_mut().set_binding(target, binding)
    }

    /// Detaches the property's binding.
    ///
    /// # Errors
    ///
    /// See [`DataBindingService::clear_binding`].
    pub fn clear_binding(
        &self,
        target: DataBindingInstanceHandle,
    ) -> Result<bool, BindingError> {
        self.service.borrow_mut().clear_binding(target)
    }
}

impl Drop for ScopedDependencyObject {
    fn drop(&mut self) {
        let handle = self.handle.get();
        if handle.is_valid() {
            self.service.borrow_mut().destroy_instance(handle);
        }
    }
}

impl fmt::Debug for ScopedDependencyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedDependencyObject")
            .field("handle", &self.handle.get())
            .finish_non_exhaustive()
    }
}

/// Owns a data-source instance in the binding service.
///
/// Data sources are what observer properties bind to: a model object marks
/// itself changed as a whole and bound observers are called back on the next
/// pass.
pub struct ScopedDataSourceObject {
    service: Rc<RefCell<DataBindingService>>,
    handle: Cell<DataBindingInstanceHandle>,
    observable: bool,
}

impl ScopedDataSourceObject {
    /// Creates a scope for one data source. The instance is registered on
    /// first use.
    #[must_use]
    pub fn new(service: Rc<RefCell<DataBindingService>>, observable: bool) -> Self {
        Self {
            service,
            handle: Cell::new(DataBindingInstanceHandle::INVALID),
            observable,
        }
    }

    /// The instance handle, or the invalid handle if nothing has
    /// materialized yet.
    #[must_use]
    pub fn instance_handle(&self) -> DataBindingInstanceHandle {
        self.handle.get()
    }

    /// The instance handle, registering the data source on first use.
    pub fn instance_handle_on_demand(&self) -> DataBindingInstanceHandle {
        let current = self.handle.get();
        if current.is_valid() {
            return current;
        }
        let handle = self
            .service
            .borrow_mut()
            .create_data_source_object(self.observable);
        self.handle.set(handle);
        handle
    }

    /// Reports that the data source changed, queueing bound observers for
    /// the next pass. Returns `false` if nothing has materialized yet.
    pub fn changed(&self, reason: PropertyChangeReason) -> bool {
        let handle = self.handle.get();
        handle.is_valid() && self.service.borrow_mut().changed(handle, reason)
    }
}

impl Drop for ScopedDataSourceObject {
    fn drop(&mut self) {
        let handle = self.handle.get();
        if handle.is_valid() {
            self.service.borrow_mut().destroy_instance(handle);
        }
    }
}

impl fmt::Debug for ScopedDataSourceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedDataSourceObject")
            .field("handle", &self.handle.get())
            .field("observable", &self.observable)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::TypedPropertyMethods;

    struct TestControl;

    fn shared_service() -> Rc<RefCell<DataBindingService>> {
        Rc::new(RefCell::new(DataBindingService::new()))
    }

    #[test]
    fn instance_is_created_on_demand_once() {
        let service = shared_service();
        let scope = ScopedDependencyObject::new(service.clone());

        assert!(!scope.instance_handle().is_valid());
        assert_eq!(service.borrow().instance_count(), 0);

        let first = scope.instance_handle_on_demand();
        let second = scope.instance_handle_on_demand();
        assert!(first.is_valid());
        assert_eq!(first, second);
        assert_eq!(service.borrow().instance_count(), 1);
    }

    #[test]
    fn drop_destroys_the_instance_and_its_properties() {
        let service = shared_service();
        let property;
        {
            let scope = ScopedDependencyObject::new(service.clone());
            let cell = Rc::new(RefCell::new(0_u32));
            property = scope
                .create_property(
                    &DependencyPropertyDefinition::create::<TestControl, u32>("Value"),
                    Rc::new(TypedPropertyMethods::new(cell)),
                )
                .unwrap();
            assert!(service.borrow().is_alive(property));
        }
        assert!(!service.borrow().is_alive(property));

        service.borrow_mut().execute_changes();
        assert_eq!(service.borrow().instance_count(), 0);
        assert_eq!(service.borrow().instance_state(property), None);
    }

    #[test]
    fn property_changed_refuses_bound_targets() {
        let service = shared_service();
        let scope = ScopedDependencyObject::new(service.clone());

        let source_cell = Rc::new(RefCell::new(1_u32));
        let source = scope
            .create_property(
                &DependencyPropertyDefinition::create::<TestControl, u32>("Source"),
                Rc::new(TypedPropertyMethods::new(source_cell)),
            )
            .unwrap();
        let target_cell = Rc::new(RefCell::new(0_u32));
        let target = scope
            .create_property(
                &DependencyPropertyDefinition::create::<TestControl, u32>("Target"),
                Rc::new(TypedPropertyMethods::new(target_cell)),
            )
            .unwrap();

        assert!(scope.property_changed(target, PropertyChangeReason::Modified));

        scope.set_binding(target, &Binding::new(source)).unwrap();
        assert!(scope.is_property_read_only(target));
        assert!(!scope.property_changed(target, PropertyChangeReason::Modified));

        scope.clear_binding(target).unwrap();
        assert!(scope.property_changed(target, PropertyChangeReason::Modified));
    }

    #[test]
    fn unmaterialized_data_source_reports_no_change() {
        let service = shared_service();
        let data_source = ScopedDataSourceObject::new(service, true);
        assert!(!data_source.changed(PropertyChangeReason::Modified));

        let handle = data_source.instance_handle_on_demand();
        assert!(handle.is_valid());
        // Changed succeeds even with no observers attached yet.
        assert!(data_source.changed(PropertyChangeReason::Modified));
    }
}
