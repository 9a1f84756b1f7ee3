// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The binding service: instance registry, binding graph and the per-frame
//! propagation pass.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;

use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::binding::{Binding, ComplexBinding, MAX_MULTI_BIND_SOURCES};
use crate::definition::DependencyPropertyDefinition;
use crate::error::{BindingError, DependencyPropertyDefinitionError};
use crate::handle::DataBindingInstanceHandle;
use crate::methods::{PropertyMethods, PropertySetResult};
use crate::slots::SlotArena;
use crate::state::{
    DataBindingInstanceState, DataBindingInstanceType, InstanceState, PropertyChangeReason,
    PropertyChangeState, PropertyMethodsImplType,
};
use crate::value::ErasedValue;

/// Upper bound on propagation re-runs within one [`DataBindingService::execute_changes`]
/// call. Exceeding it means the binding graph keeps scheduling itself and is
/// misconfigured.
const MAX_EXECUTE_LOOP_COUNT: u32 = 1024;

struct ServiceBindingRecord {
    state: InstanceState,
    name: &'static str,
    methods: Option<Rc<dyn PropertyMethods>>,
    /// The inbound binding feeding this instance, if any.
    source: Binding,
    /// Instances whose inbound binding names this instance as a source.
    targets: SmallVec<[DataBindingInstanceHandle; 2]>,
    /// Property instances owned by this container.
    properties: SmallVec<[DataBindingInstanceHandle; 2]>,
    /// Owning container, for property instances.
    parent: DataBindingInstanceHandle,
}

impl ServiceBindingRecord {
    fn container(instance_type: DataBindingInstanceType, observable: bool) -> Self {
        Self {
            state: InstanceState::new(
                instance_type,
                PropertyMethodsImplType::NotAvailable,
                observable,
            ),
            name: "",
            methods: None,
            source: Binding::default(),
            targets: SmallVec::new(),
            properties: SmallVec::new(),
            parent: DataBindingInstanceHandle::INVALID,
        }
    }
}

/// The dependency-property binding service.
///
/// Owns every bindable instance (controls, data sources and their
/// properties), the binding graph between them, and the change queue that
/// [`execute_changes`](Self::execute_changes) resolves once per frame.
///
/// The service is single-threaded; controls share it through
/// `Rc<RefCell<DataBindingService>>` (see
/// [`ScopedDependencyObject`](crate::ScopedDependencyObject)).
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use canopy_binding::{
///     Binding, DataBindingService, DependencyPropertyDefinition, TypedPropertyMethods,
/// };
///
/// struct Widget;
///
/// let mut service = DataBindingService::new();
/// let owner = service.create_dependency_object();
///
/// let width_cell = Rc::new(RefCell::new(100_u32));
/// let width = service
///     .create_dependency_object_property(
///         owner,
///         &DependencyPropertyDefinition::create::<Widget, u32>("Width"),
///         Rc::new(TypedPropertyMethods::new(width_cell.clone())),
///     )
///     .unwrap();
///
/// let height_cell = Rc::new(RefCell::new(0_u32));
/// let height = service
///     .create_dependency_object_property(
///         owner,
///         &DependencyPropertyDefinition::create::<Widget, u32>("Height"),
///         Rc::new(TypedPropertyMethods::new(height_cell.clone())),
///     )
///     .unwrap();
///
/// service.set_binding(height, &Binding::new(width)).unwrap();
/// service.execute_changes();
/// assert_eq!(*height_cell.borrow(), 100);
/// ```
pub struct DataBindingService {
    instances: SlotArena<ServiceBindingRecord>,
    pending_changes: Vec<DataBindingInstanceHandle>,
    changes_one_way: VecDeque<DataBindingInstanceHandle>,
    observer_callbacks: VecDeque<(DataBindingInstanceHandle, DataBindingInstanceHandle)>,
    scheduled_for_destroy: Vec<DataBindingInstanceHandle>,
}

impl DataBindingService {
    /// Creates an empty service.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            instances: SlotArena::new(),
            pending_changes: Vec::new(),
            changes_one_way: VecDeque::new(),
            observer_callbacks: VecDeque::new(),
            scheduled_for_destroy: Vec::new(),
        }
    }

    /// Registers a dependency object (a property container for a control).
    pub fn create_dependency_object(&mut self) -> DataBindingInstanceHandle {
        self.instances.insert(ServiceBindingRecord::container(
            DataBindingInstanceType::DependencyObject,
            false,
        ))
    }

    /// Registers a data source object.
    ///
    /// Observable data sources can be the source of observer bindings and
    /// report wholesale changes via [`changed`](Self::changed).
    pub fn create_data_source_object(&mut self, observable: bool) -> DataBindingInstanceHandle {
        self.instances.insert(ServiceBindingRecord::container(
            DataBindingInstanceType::DataSourceObject,
            observable,
        ))
    }

    /// Registers a property instance under `owner`.
    ///
    /// The instance kind is derived from the accessor table: read-write
    /// tables yield bindable read-write properties, read-only tables yield
    /// source-only properties and observer tables yield callback slots.
    ///
    /// # Errors
    ///
    /// [`BindingError::DeadInstance`] if `owner` does not resolve to a live
    /// container, [`BindingError::IncompatibleProperties`] if `owner` is
    /// itself a property, and [`BindingError::Definition`] if the accessor
    /// table's value type is not the one the definition declares.
    pub fn create_dependency_object_property(
        &mut self,
        owner: DataBindingInstanceHandle,
        definition: &DependencyPropertyDefinition,
        methods: Rc<dyn PropertyMethods>,
    ) -> Result<DataBindingInstanceHandle, BindingError> {
        {
            let owner_record = self
                .instances
                .get(owner)
                .ok_or(BindingError::DeadInstance)?;
            if !owner_record.state.is_alive() {
                return Err(BindingError::DeadInstance);
            }
            if owner_record.state.is_property() {
                return Err(BindingError::IncompatibleProperties);
            }
        }
        if methods.value_type() != definition.value_type() {
            return Err(BindingError::Definition(DependencyPropertyDefinitionError {
                name: definition.name(),
                expected: definition.value_type(),
                actual: methods.value_type(),
            }));
        }

        let impl_type = methods.impl_type();
        let (instance_type, observable) = match impl_type {
            PropertyMethodsImplType::DependencyProperty => {
                (DataBindingInstanceType::DependencyProperty, true)
            }
            PropertyMethodsImplType::ReadOnlyDependencyProperty => {
                (DataBindingInstanceType::ReadOnlyDependencyProperty, true)
            }
            PropertyMethodsImplType::Observer => {
                (DataBindingInstanceType::DependencyObserverProperty, false)
            }
            PropertyMethodsImplType::NotAvailable => return Err(BindingError::Unsupported),
        };

        let handle = self.instances.insert(ServiceBindingRecord {
            state: InstanceState::new(instance_type, impl_type, observable),
            name: definition.name(),
            methods: Some(methods),
            source: Binding::default(),
            targets: SmallVec::new(),
            properties: SmallVec::new(),
            parent: owner,
        });
        if let Some(owner_record) = self.instances.get_mut(owner) {
            owner_record.properties.push(handle);
        }
        Ok(handle)
    }

    /// Schedules `handle` and all property instances it owns for
    /// destruction.
    ///
    /// The instances stop accepting work immediately (their accessor tables
    /// are dropped and their lifecycle leaves `Alive`); the registry slots
    /// are reclaimed at the start of the next propagation pass. Returns
    /// `false` if the handle does not resolve.
    pub fn destroy_instance(&mut self, handle: DataBindingInstanceHandle) -> bool {
        let Some(record) = self.instances.get_mut(handle) else {
            return false;
        };
        if !record.state.is_alive() {
            return false;
        }
        let children: SmallVec<[DataBindingInstanceHandle; 4]> =
            record.properties.iter().copied().collect();
        Self::tombstone(record);
        self.scheduled_for_destroy.push(handle);
        for child in children {
            if let Some(child_record) = self.instances.get_mut(child)
                && child_record.state.is_alive()
            {
                Self::tombstone(child_record);
                self.scheduled_for_destroy.push(child);
            }
        }
        true
    }

    fn tombstone(record: &mut ServiceBindingRecord) {
        record
            .state
            .set_instance_state(DataBindingInstanceState::DestroyScheduled);
        record.methods = None;
    }

    /// Returns `true` if the handle resolves to a live instance.
    #[must_use]
    pub fn is_alive(&self, handle: DataBindingInstanceHandle) -> bool {
        self.instances
            .get(handle)
            .is_some_and(|record| record.state.is_alive())
    }

    /// Returns the lifecycle state, or `None` once the slot was reclaimed.
    #[must_use]
    pub fn instance_state(
        &self,
        handle: DataBindingInstanceHandle,
    ) -> Option<DataBindingInstanceState> {
        self.instances
            .get(handle)
            .map(|record| record.state.instance_state())
    }

    /// The definition name a property instance was registered under.
    ///
    /// Containers report `""`. Returns `None` once the slot was reclaimed.
    /// Intended for diagnostics and tooling.
    #[must_use]
    pub fn instance_name(&self, handle: DataBindingInstanceHandle) -> Option<&'static str> {
        self.instances.get(handle).map(|record| record.name)
    }

    /// Number of registered instances (of any kind) still occupying a slot.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Number of instances with a change queued for the next pass.
    #[must_use]
    pub fn pending_changes_count(&self) -> usize {
        self.pending_changes.len()
    }

    /// Returns `true` if writes to this property must be refused.
    ///
    /// A property is read-only to its owner while an inbound binding feeds
    /// it; a handle that no longer resolves also reads as read-only, so a
    /// stale caller cannot write.
    #[must_use]
    pub fn is_property_read_only(&self, handle: DataBindingInstanceHandle) -> bool {
        match self.instances.get(handle) {
            Some(record) => {
                !record.state.is_alive() || record.source.has_valid_source_handles()
            }
            None => true,
        }
    }

    /// Reports that an observable instance changed, queueing it for the next
    /// propagation pass.
    ///
    /// Returns `true` if the write that triggered the report may proceed.
    /// An instance that is gone or no longer alive returns `false`.
    pub fn changed(&mut self, handle: DataBindingInstanceHandle, reason: PropertyChangeReason) -> bool {
        let Some(record) = self.instances.get_mut(handle) else {
            return false;
        };
        if !record.state.is_alive() || !record.state.is_observable() {
            return false;
        }
        if record.targets.is_empty() && record.source.source_handles().is_empty() {
            // Nothing depends on it; the write itself is still fine.
            return true;
        }
        let requested = PropertyChangeState::from(reason);
        match record.state.change_state() {
            PropertyChangeState::Unchanged => {
                record.state.set_change_state(requested);
                self.pending_changes.push(handle);
            }
            PropertyChangeState::Refresh => record.state.set_change_state(requested),
            PropertyChangeState::Modified => {}
        }
        true
    }

    /// Detaches the target's inbound binding.
    ///
    /// Returns `Ok(true)` if a binding was attached, `Ok(false)` if there
    /// was nothing to clear.
    ///
    /// # Errors
    ///
    /// [`BindingError::DeadInstance`] if the handle does not resolve to a
    /// live instance.
    pub fn clear_binding(
        &mut self,
        target: DataBindingInstanceHandle,
    ) -> Result<bool, BindingError> {
        if !self.is_alive(target) {
            return Err(BindingError::DeadInstance);
        }
        Ok(self.clear_source_bindings(target))
    }

    /// Attaches (or replaces) the target's inbound binding.
    ///
    /// A binding without valid source handles clears the current binding
    /// instead. Re-attaching an identical binding is a no-op returning
    /// `Ok(false)`. On success every source is scheduled for a refresh, so
    /// the target is populated on the next pass.
    ///
    /// All validation happens before any mutation: on error the binding
    /// graph is exactly as it was.
    ///
    /// # Errors
    ///
    /// See [`BindingError`] for the rejection cases: dead endpoints,
    /// incompatible instance kinds, value types that no converter bridges,
    /// unsupported source arity, and cycles.
    pub fn set_binding(
        &mut self,
        target: DataBindingInstanceHandle,
        binding: &Binding,
    ) -> Result<bool, BindingError> {
        if !binding.has_valid_source_handles() {
            if !self.is_alive(target) {
                return Err(BindingError::DeadInstance);
            }
            return Ok(self.clear_source_bindings(target));
        }

        {
            let target_record = self
                .instances
                .get(target)
                .ok_or(BindingError::DeadInstance)?;
            if !target_record.state.is_alive() {
                return Err(BindingError::DeadInstance);
            }
            if Self::same_binding(&target_record.source, binding) {
                return Ok(false);
            }
        }

        self.validate_bind(target, binding)?;

        if binding.contains_source(target) {
            return Err(BindingError::CyclicBinding);
        }
        for &source in binding.source_handles() {
            if self.reaches(target, source) {
                return Err(BindingError::CyclicBinding);
            }
        }

        // Validation passed; apply.
        self.clear_source_bindings(target);
        for &source in binding.source_handles() {
            if let Some(source_record) = self.instances.get_mut(source) {
                source_record.targets.push(target);
            }
        }
        if let Some(target_record) = self.instances.get_mut(target) {
            target_record.source = binding.clone();
        }
        for &source in binding.source_handles() {
            self.changed(source, PropertyChangeReason::Refresh);
        }
        Ok(true)
    }

    /// Resolves all queued changes.
    ///
    /// Runs deferred destroys, determines the roots of this frame's changes,
    /// pushes values through the binding graph in dependency order (a target
    /// is resolved only after all of its sources settled), then delivers
    /// observer callbacks. Repeats while new changes were scheduled, up to a
    /// bound; exceeding the bound means the graph keeps re-scheduling itself
    /// and is misconfigured.
    pub fn execute_changes(&mut self) {
        let mut loop_count = 0_u32;
        loop {
            self.destroy_scheduled_now();
            self.determine_pending_changes();
            self.execute_pending_changes_now();
            self.execute_observer_callbacks_now();
            if self.pending_changes.is_empty() {
                break;
            }
            loop_count += 1;
            assert!(
                loop_count < MAX_EXECUTE_LOOP_COUNT,
                "binding propagation did not settle"
            );
        }
    }

    /// Reclaims destroy-scheduled instances without running a propagation
    /// pass. Intended for orderly teardown when no further frame will run.
    pub fn mark_shutdown_intend(&mut self) {
        self.destroy_scheduled_now();
    }

    fn same_binding(current: &Binding, requested: &Binding) -> bool {
        if current.source_handles() != requested.source_handles() {
            return false;
        }
        match (current.complex_binding(), requested.complex_binding()) {
            (None, None) => true,
            (Some(ComplexBinding::Converter(a)), Some(ComplexBinding::Converter(b))) => {
                Rc::ptr_eq(a, b)
            }
            (
                Some(ComplexBinding::MultiConverter(a)),
                Some(ComplexBinding::MultiConverter(b)),
            ) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn validate_bind(
        &self,
        target: DataBindingInstanceHandle,
        binding: &Binding,
    ) -> Result<(), BindingError> {
        let sources = binding.source_handles();
        if sources.is_empty() || sources.len() > MAX_MULTI_BIND_SOURCES {
            return Err(BindingError::Unsupported);
        }

        let target_record = self
            .instances
            .get(target)
            .ok_or(BindingError::DeadInstance)?;

        match target_record.state.instance_type() {
            DataBindingInstanceType::DependencyProperty => {
                self.validate_bind_to_property(target_record, binding)
            }
            DataBindingInstanceType::DependencyObserverProperty => {
                self.validate_bind_to_observer(binding)
            }
            // Containers and source-only properties cannot be fed.
            _ => Err(BindingError::IncompatibleProperties),
        }
    }

    fn validate_bind_to_property(
        &self,
        target_record: &ServiceBindingRecord,
        binding: &Binding,
    ) -> Result<(), BindingError> {
        let target_methods = target_record
            .methods
            .as_ref()
            .ok_or(BindingError::DeadInstance)?;
        let target_type = target_methods.value_type();

        let mut source_types: SmallVec<[core::any::TypeId; MAX_MULTI_BIND_SOURCES]> =
            SmallVec::new();
        for &source in binding.source_handles() {
            let source_record = self
                .instances
                .get(source)
                .ok_or(BindingError::DeadInstance)?;
            if !source_record.state.is_alive() {
                return Err(BindingError::DeadInstance);
            }
            if !matches!(
                source_record.state.instance_type(),
                DataBindingInstanceType::DependencyProperty
                    | DataBindingInstanceType::ReadOnlyDependencyProperty
            ) {
                return Err(BindingError::IncompatibleProperties);
            }
            let source_methods = source_record
                .methods
                .as_ref()
                .ok_or(BindingError::DeadInstance)?;
            source_types.push(source_methods.value_type());
        }

        match binding.complex_binding() {
            None => {
                let [source_type] = source_types.as_slice() else {
                    return Err(BindingError::Unsupported);
                };
                if *source_type != target_type {
                    return Err(BindingError::IncompatibleTypes {
                        target: target_type,
                        source: *source_type,
                    });
                }
                Ok(())
            }
            Some(ComplexBinding::Converter(converter)) => {
                let [source_type] = source_types.as_slice() else {
                    return Err(BindingError::Unsupported);
                };
                if converter.target_type() != target_type {
                    return Err(BindingError::IncompatibleTypes {
                        target: target_type,
                        source: converter.target_type(),
                    });
                }
                if converter.source_type() != *source_type {
                    return Err(BindingError::IncompatibleTypes {
                        target: converter.source_type(),
                        source: *source_type,
                    });
                }
                Ok(())
            }
            Some(ComplexBinding::MultiConverter(converter)) => {
                let expected = converter.source_types();
                if expected.len() != source_types.len() {
                    return Err(BindingError::Unsupported);
                }
                if converter.target_type() != target_type {
                    return Err(BindingError::IncompatibleTypes {
                        target: target_type,
                        source: converter.target_type(),
                    });
                }
                for (expected, actual) in expected.iter().zip(&source_types) {
                    if expected != actual {
                        return Err(BindingError::IncompatibleTypes {
                            target: *expected,
                            source: *actual,
                        });
                    }
                }
                Ok(())
            }
        }
    }

    fn validate_bind_to_observer(&self, binding: &Binding) -> Result<(), BindingError> {
        if binding.complex_binding().is_some() {
            return Err(BindingError::Unsupported);
        }
        let [source] = binding.source_handles() else {
            return Err(BindingError::Unsupported);
        };
        let source_record = self
            .instances
            .get(*source)
            .ok_or(BindingError::DeadInstance)?;
        if !source_record.state.is_alive() {
            return Err(BindingError::DeadInstance);
        }
        if source_record.state.instance_type() != DataBindingInstanceType::DataSourceObject {
            return Err(BindingError::IncompatibleProperties);
        }
        if !source_record.state.is_observable() {
            return Err(BindingError::IncompatibleProperties);
        }
        Ok(())
    }

    /// Returns `true` if `to` is reachable from `from` along target edges.
    fn reaches(&self, from: DataBindingInstanceHandle, to: DataBindingInstanceHandle) -> bool {
        if from == to {
            return true;
        }
        let mut visited: HashSet<DataBindingInstanceHandle> = HashSet::new();
        let mut stack: Vec<DataBindingInstanceHandle> = Vec::new();
        stack.push(from);
        visited.insert(from);
        while let Some(current) = stack.pop() {
            let Some(record) = self.instances.get(current) else {
                continue;
            };
            for &next in &record.targets {
                if next == to {
                    return true;
                }
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }
        false
    }

    fn clear_source_bindings(&mut self, target: DataBindingInstanceHandle) -> bool {
        let Some(record) = self.instances.get_mut(target) else {
            return false;
        };
        let old = core::mem::take(&mut record.source);
        if old.source_handles().is_empty() {
            return false;
        }
        for &source in old.source_handles() {
            if let Some(source_record) = self.instances.get_mut(source) {
                source_record.targets.retain(|candidate| *candidate != target);
            }
        }
        true
    }

    fn destroy_scheduled_now(&mut self) {
        while let Some(handle) = self.scheduled_for_destroy.pop() {
            let Some(record) = self.instances.remove(handle) else {
                continue;
            };
            // Reclaiming the slot is the terminal transition: the generation
            // bump makes every copy of the handle unresolvable.

            // Detach from the sources feeding it.
            for &source in record.source.source_handles() {
                if let Some(source_record) = self.instances.get_mut(source) {
                    source_record.targets.retain(|candidate| *candidate != handle);
                }
            }
            // Targets it fed lose their inbound binding.
            for &fed in &record.targets {
                if let Some(fed_record) = self.instances.get_mut(fed)
                    && fed_record.source.contains_source(handle)
                {
                    fed_record.source = Binding::default();
                }
            }
            if let Some(parent_record) = self.instances.get_mut(record.parent) {
                parent_record.properties.retain(|candidate| *candidate != handle);
            }
            self.pending_changes.retain(|&candidate| candidate != handle);
        }
    }

    fn determine_pending_changes(&mut self) {
        let pending: Vec<DataBindingInstanceHandle> = self.pending_changes.drain(..).collect();
        for handle in pending {
            let Some(record) = self.instances.get_mut(handle) else {
                continue;
            };
            record.state.clear_change_state();
            if !record.state.is_alive() {
                continue;
            }
            if record.source.has_valid_source_handles() {
                // Fed instances drag their whole source chain in, so their
                // value is rebuilt only after every source settled.
                self.recursive_mark_as_changed(handle);
            } else if !record.targets.is_empty() && !record.state.has_pending_changes() {
                record.state.mark_pending_changes();
                self.changes_one_way.push_back(handle);
            }
        }
    }

    fn recursive_mark_as_changed(&mut self, handle: DataBindingInstanceHandle) {
        let Some(record) = self.instances.get_mut(handle) else {
            return;
        };
        let was_marked = record.state.has_pending_changes();
        record.state.mark_pending_changes();

        let sources: SmallVec<[DataBindingInstanceHandle; MAX_MULTI_BIND_SOURCES]> =
            record.source.source_handles().iter().copied().collect();
        let mut found_live_source = false;
        for source in sources {
            if self
                .instances
                .get(source)
                .is_some_and(|source_record| source_record.state.is_alive())
            {
                found_live_source = true;
                self.recursive_mark_as_changed(source);
            }
        }
        if !found_live_source && !was_marked {
            self.changes_one_way.push_back(handle);
        }
    }

    fn execute_pending_changes_now(&mut self) {
        while let Some(handle) = self.changes_one_way.pop_front() {
            let Some(record) = self.instances.get_mut(handle) else {
                continue;
            };
            record.state.clear_pending_changes();
            if !record.state.is_alive() {
                continue;
            }
            self.execute_one_way_changes_to(handle);
        }
    }

    fn execute_one_way_changes_to(&mut self, source: DataBindingInstanceHandle) {
        let Some(source_record) = self.instances.get(source) else {
            return;
        };
        let targets: SmallVec<[DataBindingInstanceHandle; 4]> =
            source_record.targets.iter().copied().collect();

        for target in targets {
            let Some(target_record) = self.instances.get(target) else {
                continue;
            };
            if !target_record.state.is_alive() {
                continue;
            }
            match target_record.state.instance_type() {
                DataBindingInstanceType::DependencyObserverProperty => {
                    self.observer_callbacks.push_back((target, source));
                }
                DataBindingInstanceType::DependencyProperty => {
                    let had_pending = target_record.state.has_pending_changes();
                    let changed = self.execute_get_set(target, source);
                    if changed || had_pending {
                        if let Some(record) = self.instances.get_mut(target) {
                            record.state.clear_pending_changes();
                        }
                        self.execute_one_way_changes_to(target);
                    }
                }
                _ => {
                    debug_assert!(false, "instance kind cannot be a binding target");
                }
            }
        }
    }

    fn execute_get_set(
        &mut self,
        target: DataBindingInstanceHandle,
        triggering_source: DataBindingInstanceHandle,
    ) -> bool {
        let Some(target_record) = self.instances.get(target) else {
            return false;
        };
        let Some(target_methods) = target_record.methods.clone() else {
            return false;
        };
        let complex = target_record.source.complex_binding().cloned();

        let result = match complex {
            None => {
                let Some(source_methods) = self.methods_of(triggering_source) else {
                    return false;
                };
                target_methods.try_set_from(&*source_methods)
            }
            Some(ComplexBinding::Converter(converter)) => {
                let Some(source_methods) = self.methods_of(triggering_source) else {
                    return false;
                };
                let value = converter
                    .convert(&source_methods.get_erased())
                    .expect("validated converter rejected its source value");
                target_methods.try_set_erased(value)
            }
            Some(ComplexBinding::MultiConverter(converter)) => {
                let sources: SmallVec<[DataBindingInstanceHandle; MAX_MULTI_BIND_SOURCES]> = self
                    .instances
                    .get(target)
                    .map(|record| record.source.source_handles().iter().copied().collect())
                    .unwrap_or_default();
                let mut values: SmallVec<[ErasedValue; MAX_MULTI_BIND_SOURCES]> = SmallVec::new();
                for source in sources {
                    let Some(source_methods) = self.methods_of(source) else {
                        return false;
                    };
                    values.push(source_methods.get_erased());
                }
                let value = converter
                    .convert(&values)
                    .expect("validated converter rejected its source values");
                target_methods.try_set_erased(value)
            }
        };

        debug_assert!(
            matches!(
                result,
                PropertySetResult::ValueChanged | PropertySetResult::ValueUnchanged
            ),
            "validated binding failed to execute"
        );
        result.value_changed()
    }

    fn methods_of(&self, handle: DataBindingInstanceHandle) -> Option<Rc<dyn PropertyMethods>> {
        self.instances
            .get(handle)
            .filter(|record| record.state.is_alive())
            .and_then(|record| record.methods.clone())
    }

    fn execute_observer_callbacks_now(&mut self) {
        while let Some((target, source)) = self.observer_callbacks.pop_front() {
            let Some(methods) = self.methods_of(target) else {
                continue;
            };
            methods.try_invoke(source);
        }
    }
}

impl Default for DataBindingService {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for DataBindingService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DataBindingService")
            .field("instances", &self.instances)
            .field("pending_changes", &self.pending_changes.len())
            .finish_non_exhaustive()
    }
}
