// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed property cells embedded in controls.
//!
//! A property starts as a plain inline value. Only when something observes
//! it (a handle is requested, or a binding is attached) does it materialize:
//! the value moves into a shared cell, an accessor table over that cell is
//! registered with the service, and from then on binding-driven writes land
//! directly in the storage the control reads.

use alloc::rc::Rc;
use alloc::string::String;
use core::any::TypeId;
use core::cell::{Ref, RefCell};
use core::fmt;
use core::ops::Deref;

use crate::binding::Binding;
use crate::definition::{
    DependencyPropertyDefinition, ObserverPropertyMethodsDefinition, TypedPropertyMethodsDefinition,
};
use crate::error::{BindingError, DependencyPropertyDefinitionError};
use crate::handle::DataBindingInstanceHandle;
use crate::methods::{ObserverPropertyMethods, ReadOnlyPropertyMethods, TypedPropertyMethods};
use crate::scope::ScopedDependencyObject;
use crate::state::PropertyChangeReason;

enum Storage<T> {
    Direct(T),
    Shared(Rc<RefCell<T>>),
}

impl<T: Clone + PartialEq> Storage<T> {
    fn get(&self) -> T {
        match self {
            Self::Direct(value) => value.clone(),
            Self::Shared(cell) => cell.borrow().clone(),
        }
    }

    fn equals(&self, value: &T) -> bool {
        match self {
            Self::Direct(current) => current == value,
            Self::Shared(cell) => *cell.borrow() == *value,
        }
    }

    fn store(&mut self, value: T) {
        match self {
            Self::Direct(current) => *current = value,
            Self::Shared(cell) => *cell.borrow_mut() = value,
        }
    }

    /// Moves the value into a shared cell, if it is not in one already.
    fn share(&mut self) -> Rc<RefCell<T>> {
        match self {
            Self::Shared(cell) => cell.clone(),
            Self::Direct(value) => {
                let cell = Rc::new(RefCell::new(value.clone()));
                *self = Self::Shared(cell.clone());
                cell
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Storage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(value) => f.debug_tuple("Direct").field(value).finish(),
            Self::Shared(cell) => f.debug_tuple("Shared").field(&cell.borrow()).finish(),
        }
    }
}

fn check_definition<T: 'static>(
    definition: &DependencyPropertyDefinition,
) -> Result<(), BindingError> {
    if definition
        .methods()
        .as_any()
        .downcast_ref::<TypedPropertyMethodsDefinition<T>>()
        .is_none()
    {
        return Err(BindingError::Definition(DependencyPropertyDefinitionError {
            name: definition.name(),
            expected: definition.value_type(),
            actual: TypeId::of::<T>(),
        }));
    }
    Ok(())
}

/// A bindable, control-owned property of type `T`.
///
/// Unobserved properties are free: the value lives inline and the binding
/// service knows nothing about them. Materialization happens on demand and
/// is permanent for the life of the property.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use canopy_binding::{
///     Binding, DataBindingService, DependencyPropertyDefinition, PropertyChangeReason,
///     ScopedDependencyObject, TypedDependencyProperty, ValueConverterBinding,
/// };
///
/// struct Window;
///
/// let service = Rc::new(RefCell::new(DataBindingService::new()));
/// let scope = ScopedDependencyObject::new(service.clone());
///
/// let width_def = DependencyPropertyDefinition::create::<Window, u32>("Width");
/// let height_def = DependencyPropertyDefinition::create::<Window, u32>("Height");
///
/// let mut width = TypedDependencyProperty::new(100_u32);
/// assert!(!width.set(&scope, 100, PropertyChangeReason::Modified));
/// assert!(width.set(&scope, 200, PropertyChangeReason::Modified));
///
/// let mut height = TypedDependencyProperty::new(0_u32);
/// let width_handle = width
///     .get_instance_handle_on_demand(&scope, &width_def)
///     .unwrap();
/// let doubler = Rc::new(ValueConverterBinding::new(|width: &u32| width * 2));
/// height
///     .set_binding(&scope, &height_def, &Binding::with_converter(doubler, width_handle))
///     .unwrap();
///
/// service.borrow_mut().execute_changes();
/// assert_eq!(height.get(), 400);
/// ```
pub struct TypedDependencyProperty<T: Clone + PartialEq + 'static> {
    storage: Storage<T>,
    handle: DataBindingInstanceHandle,
}

impl<T: Clone + PartialEq + 'static> TypedDependencyProperty<T> {
    /// Creates an unmaterialized property holding `initial`.
    #[must_use]
    pub const fn new(initial: T) -> Self {
        Self {
            storage: Storage::Direct(initial),
            handle: DataBindingInstanceHandle::INVALID,
        }
    }

    /// Clones out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.storage.get()
    }

    /// Stores `value`, reporting whether anything changed.
    ///
    /// Writing the current value back is a no-op returning `false`. Once
    /// materialized, the write is gated through the owner scope: it is
    /// refused (returning `false`, value untouched) while a binding feeds
    /// this property.
    pub fn set(
        &mut self,
        scope: &ScopedDependencyObject,
        value: T,
        reason: PropertyChangeReason,
    ) -> bool {
        if self.storage.equals(&value) {
            return false;
        }
        if self.handle.is_valid() && !scope.property_changed(self.handle, reason) {
            return false;
        }
        self.storage.store(value);
        true
    }

    /// The instance handle, or the invalid handle before materialization.
    #[must_use]
    pub fn instance_handle(&self) -> DataBindingInstanceHandle {
        self.handle
    }

    /// Returns `true` if `handle` refers to this property's instance.
    #[must_use]
    pub fn is_instance(&self, handle: DataBindingInstanceHandle) -> bool {
        self.handle.is_valid() && self.handle == handle
    }

    /// Returns `true` if a binding currently feeds this property.
    #[must_use]
    pub fn is_read_only(&self, scope: &ScopedDependencyObject) -> bool {
        self.handle.is_valid() && scope.is_property_read_only(self.handle)
    }

    /// The instance handle, materializing the property on first use.
    ///
    /// # Errors
    ///
    /// [`BindingError::Definition`] if `definition` was declared with a
    /// value type other than `T`.
    pub fn get_instance_handle_on_demand(
        &mut self,
        scope: &ScopedDependencyObject,
        definition: &DependencyPropertyDefinition,
    ) -> Result<DataBindingInstanceHandle, BindingError> {
        if self.handle.is_valid() {
            return Ok(self.handle);
        }
        check_definition::<T>(definition)?;
        let cell = self.storage.share();
        self.handle = scope.create_property(definition, Rc::new(TypedPropertyMethods::new(cell)))?;
        Ok(self.handle)
    }

    /// Attaches a binding feeding this property.
    ///
    /// An empty binding on a property that never materialized is a no-op
    /// returning `Ok(false)`; in particular it does not materialize the
    /// property. Otherwise the property materializes on demand and the
    /// binding is validated and attached by the service.
    ///
    /// # Errors
    ///
    /// See [`DataBindingService::set_binding`](crate::DataBindingService::set_binding)
    /// and [`Self::get_instance_handle_on_demand`].
    pub fn set_binding(
        &mut self,
        scope: &ScopedDependencyObject,
        definition: &DependencyPropertyDefinition,
        binding: &Binding,
    ) -> Result<bool, BindingError> {
        if !self.handle.is_valid() && !binding.has_valid_source_handles() {
            return Ok(false);
        }
        let handle = self.get_instance_handle_on_demand(scope, definition)?;
        scope.set_binding(handle, binding)
    }

    /// Detaches this property's binding, if it has one.
    ///
    /// # Errors
    ///
    /// See [`DataBindingService::clear_binding`](crate::DataBindingService::clear_binding).
    pub fn clear_binding(&mut self, scope: &ScopedDependencyObject) -> Result<bool, BindingError> {
        if !self.handle.is_valid() {
            return Ok(false);
        }
        scope.clear_binding(self.handle)
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for TypedDependencyProperty<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for TypedDependencyProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedDependencyProperty")
            .field("storage", &self.storage)
            .field("handle", &self.handle)
            .finish()
    }
}

/// A control-driven, source-only property of type `T`.
///
/// Other properties can bind to it; nothing can bind to it. The owning
/// control remains free to write it at any time.
pub struct TypedReadOnlyDependencyProperty<T: Clone + PartialEq + 'static> {
    storage: Storage<T>,
    handle: DataBindingInstanceHandle,
}

impl<T: Clone + PartialEq + 'static> TypedReadOnlyDependencyProperty<T> {
    /// Creates an unmaterialized property holding `initial`.
    #[must_use]
    pub const fn new(initial: T) -> Self {
        Self {
            storage: Storage::Direct(initial),
            handle: DataBindingInstanceHandle::INVALID,
        }
    }

    /// Clones out the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.storage.get()
    }

    /// Stores `value`, reporting whether anything changed.
    pub fn set(
        &mut self,
        scope: &ScopedDependencyObject,
        value: T,
        reason: PropertyChangeReason,
    ) -> bool {
        if self.storage.equals(&value) {
            return false;
        }
        if self.handle.is_valid() && !scope.property_changed(self.handle, reason) {
            return false;
        }
        self.storage.store(value);
        true
    }

    /// The instance handle, or the invalid handle before materialization.
    #[must_use]
    pub fn instance_handle(&self) -> DataBindingInstanceHandle {
        self.handle
    }

    /// The instance handle, materializing the property on first use.
    ///
    /// # Errors
    ///
    /// [`BindingError::Definition`] if `definition` was declared with a
    /// value type other than `T`.
    pub fn get_instance_handle_on_demand(
        &mut self,
        scope: &ScopedDependencyObject,
        definition: &DependencyPropertyDefinition,
    ) -> Result<DataBindingInstanceHandle, BindingError> {
        if self.handle.is_valid() {
            return Ok(self.handle);
        }
        check_definition::<T>(definition)?;
        let cell = self.storage.share();
        self.handle =
            scope.create_property(definition, Rc::new(ReadOnlyPropertyMethods::new(cell)))?;
        Ok(self.handle)
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for TypedReadOnlyDependencyProperty<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for TypedReadOnlyDependencyProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedReadOnlyDependencyProperty")
            .field("storage", &self.storage)
            .field("handle", &self.handle)
            .finish()
    }
}

/// A borrowed view of a [`StringDependencyProperty`] value.
pub struct StrRef<'a> {
    inner: StrRefInner<'a>,
}

enum StrRefInner<'a> {
    Direct(&'a str),
    Shared(Ref<'a, String>),
}

impl Deref for StrRef<'_> {
    type Target = str;

    fn deref(&self) -> &str {
        match &self.inner {
            StrRefInner::Direct(value) => value,
            StrRefInner::Shared(guard) => guard.as_str(),
        }
    }
}

impl PartialEq<&str> for StrRef<'_> {
    fn eq(&self, other: &&str) -> bool {
        &**self == *other
    }
}

impl fmt::Display for StrRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self)
    }
}

impl fmt::Debug for StrRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&**self, f)
    }
}

/// A bindable string property with owned storage and borrowed reads.
///
/// The value is stored as a `String` (and bound as one), but
/// [`get`](Self::get) hands out a view instead of cloning, so callers that
/// only need to look at the text never pay for an allocation.
pub struct StringDependencyProperty {
    storage: Storage<String>,
    handle: DataBindingInstanceHandle,
}

impl StringDependencyProperty {
    /// Creates an unmaterialized property holding `initial`.
    #[must_use]
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            storage: Storage::Direct(initial.into()),
            handle: DataBindingInstanceHandle::INVALID,
        }
    }

    /// A borrowed view of the current value.
    ///
    /// The view holds the property's cell borrowed; drop it before the next
    /// propagation pass runs.
    #[must_use]
    pub fn get(&self) -> StrRef<'_> {
        let inner = match &self.storage {
            Storage::Direct(value) => StrRefInner::Direct(value),
            Storage::Shared(cell) => StrRefInner::Shared(cell.borrow()),
        };
        StrRef { inner }
    }

    /// Stores `value`, reporting whether anything changed. Allocates only
    /// when the value actually differs.
    pub fn set(
        &mut self,
        scope: &ScopedDependencyObject,
        value: &str,
        reason: PropertyChangeReason,
    ) -> bool {
        if *self.get() == *value {
            return false;
        }
        if self.handle.is_valid() && !scope.property_changed(self.handle, reason) {
            return false;
        }
        self.storage.store(String::from(value));
        true
    }

    /// The instance handle, or the invalid handle before materialization.
    #[must_use]
    pub fn instance_handle(&self) -> DataBindingInstanceHandle {
        self.handle
    }

    /// Returns `true` if a binding currently feeds this property.
    #[must_use]
    pub fn is_read_only(&self, scope: &ScopedDependencyObject) -> bool {
        self.handle.is_valid() && scope.is_property_read_only(self.handle)
    }

    /// The instance handle, materializing the property on first use.
    ///
    /// # Errors
    ///
    /// [`BindingError::Definition`] if `definition` was not declared with
    /// value type `String`.
    pub fn get_instance_handle_on_demand(
        &mut self,
        scope: &ScopedDependencyObject,
        definition: &DependencyPropertyDefinition,
    ) -> Result<DataBindingInstanceHandle, BindingError> {
        if self.handle.is_valid() {
            return Ok(self.handle);
        }
        check_definition::<String>(definition)?;
        let cell = self.storage.share();
        self.handle = scope.create_property(definition, Rc::new(TypedPropertyMethods::new(cell)))?;
        Ok(self.handle)
    }

    /// Attaches a binding feeding this property. Same fast-exit contract as
    /// [`TypedDependencyProperty::set_binding`].
    ///
    /// # Errors
    ///
    /// See [`DataBindingService::set_binding`](crate::DataBindingService::set_binding).
    pub fn set_binding(
        &mut self,
        scope: &ScopedDependencyObject,
        definition: &DependencyPropertyDefinition,
        binding: &Binding,
    ) -> Result<bool, BindingError> {
        if !self.handle.is_valid() && !binding.has_valid_source_handles() {
            return Ok(false);
        }
        let handle = self.get_instance_handle_on_demand(scope, definition)?;
        scope.set_binding(handle, binding)
    }
}

impl Default for StringDependencyProperty {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for StringDependencyProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringDependencyProperty")
            .field("storage", &self.storage)
            .field("handle", &self.handle)
            .finish()
    }
}

/// A callback slot bound to a data source.
///
/// The callback is captured at construction; after each propagation pass it
/// is invoked once per bound source that changed, receiving that source's
/// handle. The callback must not call back into the binding service.
pub struct DependencyObserverProperty {
    callback: Rc<dyn Fn(DataBindingInstanceHandle)>,
    handle: DataBindingInstanceHandle,
}

impl DependencyObserverProperty {
    /// Creates an unmaterialized observer around `callback`.
    #[must_use]
    pub fn new(callback: impl Fn(DataBindingInstanceHandle) + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
            handle: DataBindingInstanceHandle::INVALID,
        }
    }

    /// The instance handle, or the invalid handle before materialization.
    #[must_use]
    pub fn instance_handle(&self) -> DataBindingInstanceHandle {
        self.handle
    }

    /// The instance handle, materializing the observer on first use.
    ///
    /// # Errors
    ///
    /// [`BindingError::Definition`] if `definition` is not an observer
    /// definition.
    pub fn get_instance_handle_on_demand(
        &mut self,
        scope: &ScopedDependencyObject,
        definition: &DependencyPropertyDefinition,
    ) -> Result<DataBindingInstanceHandle, BindingError> {
        if self.handle.is_valid() {
            return Ok(self.handle);
        }
        if definition
            .methods()
            .as_any()
            .downcast_ref::<ObserverPropertyMethodsDefinition>()
            .is_none()
        {
            return Err(BindingError::Definition(DependencyPropertyDefinitionError {
                name: definition.name(),
                expected: definition.value_type(),
                actual: TypeId::of::<()>(),
            }));
        }
        self.handle = scope.create_property(
            definition,
            Rc::new(ObserverPropertyMethods::new(self.callback.clone())),
        )?;
        Ok(self.handle)
    }

    /// Binds this observer to a data source. Same fast-exit contract as
    /// [`TypedDependencyProperty::set_binding`].
    ///
    /// # Errors
    ///
    /// See [`DataBindingService::set_binding`](crate::DataBindingService::set_binding).
    pub fn set_binding(
        &mut self,
        scope: &ScopedDependencyObject,
        definition: &DependencyPropertyDefinition,
        binding: &Binding,
    ) -> Result<bool, BindingError> {
        if !self.handle.is_valid() && !binding.has_valid_source_handles() {
            return Ok(false);
        }
        let handle = self.get_instance_handle_on_demand(scope, definition)?;
        scope.set_binding(handle, binding)
    }
}

impl fmt::Debug for DependencyObserverProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyObserverProperty")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ValueConverterBinding;
    use crate::scope::ScopedDataSourceObject;
    use crate::service::DataBindingService;
    use alloc::vec::Vec;

    struct Window;

    fn shared_service() -> Rc<RefCell<DataBindingService>> {
        Rc::new(RefCell::new(DataBindingService::new()))
    }

    #[test]
    fn unobserved_property_costs_the_service_nothing() {
        let service = shared_service();
        let scope = ScopedDependencyObject::new(service.clone());

        let mut width = TypedDependencyProperty::new(100_u32);
        assert!(!width.set(&scope, 100, PropertyChangeReason::Modified));
        assert!(width.set(&scope, 200, PropertyChangeReason::Modified));
        assert_eq!(width.get(), 200);

        assert_eq!(service.borrow().instance_count(), 0);
        assert!(!width.instance_handle().is_valid());
    }

    #[test]
    fn empty_binding_on_unmaterialized_property_is_a_no_op() {
        let service = shared_service();
        let scope = ScopedDependencyObject::new(service.clone());
        let definition = DependencyPropertyDefinition::create::<Window, u32>("Width");

        let mut width = TypedDependencyProperty::new(0_u32);
        let attached = width
            .set_binding(&scope, &definition, &Binding::default())
            .unwrap();
        assert!(!attached);
        assert_eq!(service.borrow().instance_count(), 0);
        assert!(!width.instance_handle().is_valid());
    }

    #[test]
    fn materialization_is_stable_and_preserves_the_value() {
        let service = shared_service();
        let scope = ScopedDependencyObject::new(service.clone());
        let definition = DependencyPropertyDefinition::create::<Window, u32>("Width");

        let mut width = TypedDependencyProperty::new(17_u32);
        let first = width
            .get_instance_handle_on_demand(&scope, &definition)
            .unwrap();
        let second = width
            .get_instance_handle_on_demand(&scope, &definition)
            .unwrap();
        assert_eq!(first, second);
        assert!(width.is_instance(first));
        assert_eq!(width.get(), 17);
        // Owner object plus the property.
        assert_eq!(service.borrow().instance_count(), 2);
    }

    #[test]
    fn definition_type_mismatch_is_a_configuration_error() {
        let service = shared_service();
        let scope = ScopedDependencyObject::new(service);
        let wrong = DependencyPropertyDefinition::create::<Window, f32>("Width");

        let mut width = TypedDependencyProperty::new(0_u32);
        assert!(matches!(
            width.get_instance_handle_on_demand(&scope, &wrong),
            Err(BindingError::Definition(_))
        ));
    }

    #[test]
    fn width_drives_height_through_a_converter() {
        let service = shared_service();
        let scope = ScopedDependencyObject::new(service.clone());
        let width_def = DependencyPropertyDefinition::create::<Window, u32>("Width");
        let height_def = DependencyPropertyDefinition::create::<Window, u32>("Height");

        let mut width = TypedDependencyProperty::new(100_u32);
        assert!(!width.set(&scope, 100, PropertyChangeReason::Modified));
        assert!(width.set(&scope, 200, PropertyChangeReason::Modified));

        let width_handle = width
            .get_instance_handle_on_demand(&scope, &width_def)
            .unwrap();

        let mut height = TypedDependencyProperty::new(0_u32);
        let doubler: Rc<dyn crate::ConverterBinding> =
            Rc::new(ValueConverterBinding::new(|width: &u32| width * 2));
        let attached = height
            .set_binding(
                &scope,
                &height_def,
                &Binding::with_converter(doubler, width_handle),
            )
            .unwrap();
        assert!(attached);

        service.borrow_mut().execute_changes();
        assert_eq!(height.get(), 400);

        // The bound target refuses direct writes and keeps following.
        assert!(!height.set(&scope, 5, PropertyChangeReason::Modified));
        assert!(height.is_read_only(&scope));
        assert!(width.set(&scope, 300, PropertyChangeReason::Modified));
        service.borrow_mut().execute_changes();
        assert_eq!(height.get(), 600);
    }

    #[test]
    fn set_after_materialization_schedules_and_updates_the_shared_cell() {
        let service = shared_service();
        let scope = ScopedDependencyObject::new(service.clone());
        let source_def = DependencyPropertyDefinition::create::<Window, u32>("Source");
        let target_def = DependencyPropertyDefinition::create::<Window, u32>("Target");

        let mut source = TypedDependencyProperty::new(0_u32);
        let source_handle = source
            .get_instance_handle_on_demand(&scope, &source_def)
            .unwrap();
        let mut target = TypedDependencyProperty::new(0_u32);
        target
            .set_binding(&scope, &target_def, &Binding::new(source_handle))
            .unwrap();
        service.borrow_mut().execute_changes();

        assert!(source.set(&scope, 12, PropertyChangeReason::Modified));
        assert_eq!(source.get(), 12);
        assert_eq!(target.get(), 0);
        service.borrow_mut().execute_changes();
        assert_eq!(target.get(), 12);
    }

    #[test]
    fn read_only_property_feeds_bindings_but_takes_none() {
        let service = shared_service();
        let scope = ScopedDependencyObject::new(service.clone());
        let frames_def = DependencyPropertyDefinition::create::<Window, u32>("FrameCount");
        let shown_def = DependencyPropertyDefinition::create::<Window, u32>("ShownFrames");

        let mut frames = TypedReadOnlyDependencyProperty::new(0_u32);
        let frames_handle = frames
            .get_instance_handle_on_demand(&scope, &frames_def)
            .unwrap();

        let mut shown = TypedDependencyProperty::new(0_u32);
        shown
            .set_binding(&scope, &shown_def, &Binding::new(frames_handle))
            .unwrap();

        assert!(frames.set(&scope, 60, PropertyChangeReason::Modified));
        service.borrow_mut().execute_changes();
        assert_eq!(shown.get(), 60);
    }

    #[test]
    fn string_property_reads_borrow_and_writes_compare() {
        let service = shared_service();
        let scope = ScopedDependencyObject::new(service.clone());
        let caption_def = DependencyPropertyDefinition::create::<Window, String>("Caption");
        let title_def = DependencyPropertyDefinition::create::<Window, String>("Title");

        let mut caption = StringDependencyProperty::new("hello");
        assert_eq!(caption.get(), "hello");
        assert!(!caption.set(&scope, "hello", PropertyChangeReason::Modified));
        assert!(caption.set(&scope, "world", PropertyChangeReason::Modified));
        assert_eq!(caption.get(), "world");
        assert_eq!(service.borrow().instance_count(), 0);

        let caption_handle = caption
            .get_instance_handle_on_demand(&scope, &caption_def)
            .unwrap();
        assert_eq!(caption.get(), "world");

        let mut title = StringDependencyProperty::default();
        title
            .set_binding(&scope, &title_def, &Binding::new(caption_handle))
            .unwrap();
        service.borrow_mut().execute_changes();
        assert_eq!(title.get(), "world");
        assert!(title.is_read_only(&scope));
    }

    #[test]
    fn string_definition_must_declare_string() {
        let service = shared_service();
        let scope = ScopedDependencyObject::new(service);
        let wrong = DependencyPropertyDefinition::create::<Window, u32>("Caption");

        let mut caption = StringDependencyProperty::new("x");
        assert!(matches!(
            caption.get_instance_handle_on_demand(&scope, &wrong),
            Err(BindingError::Definition(_))
        ));
    }

    #[test]
    fn observer_property_hears_its_data_source() {
        let service = shared_service();
        let scope = ScopedDependencyObject::new(service.clone());
        let data_source = ScopedDataSourceObject::new(service.clone(), true);
        let items_def = DependencyPropertyDefinition::create_observer::<Window>("ItemsChanged");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut observer = DependencyObserverProperty::new(move |source| {
            sink.borrow_mut().push(source);
        });

        let source_handle = data_source.instance_handle_on_demand();
        observer
            .set_binding(&scope, &items_def, &Binding::new(source_handle))
            .unwrap();
        service.borrow_mut().execute_changes();
        assert_eq!(seen.borrow().as_slice(), &[source_handle]);

        assert!(data_source.changed(PropertyChangeReason::Modified));
        service.borrow_mut().execute_changes();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn handles_from_a_dropped_owner_stop_resolving() {
        let service = shared_service();
        let definition = DependencyPropertyDefinition::create::<Window, u32>("Width");

        let handle;
        {
            let scope = ScopedDependencyObject::new(service.clone());
            let mut width = TypedDependencyProperty::new(1_u32);
            handle = width
                .get_instance_handle_on_demand(&scope, &definition)
                .unwrap();
            assert!(service.borrow().is_alive(handle));
        }
        assert!(!service.borrow().is_alive(handle));
        service.borrow_mut().execute_changes();
        assert_eq!(service.borrow().instance_state(handle), None);
        assert!(service.borrow().is_property_read_only(handle));
    }
}
