// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small end-to-end tour of the data-binding engine: a slider drives a
//! progress bar through a converter, a label fuses two values, and an
//! observer watches a data source. Each "frame" is one
//! [`DataBindingService::execute_changes`] call.

use std::cell::RefCell;
use std::rc::Rc;

use canopy_binding::{
    Binding, DataBindingService, DependencyObserverProperty, DependencyPropertyDefinition,
    MultiConverterBinding2, PropertyChangeReason, ScopedDataSourceObject, ScopedDependencyObject,
    StringDependencyProperty, TypedDependencyProperty, ValueConverterBinding,
};

struct Slider;
struct ProgressBar;

struct SliderControl {
    scope: ScopedDependencyObject,
    value: TypedDependencyProperty<u32>,
    max_value: TypedDependencyProperty<u32>,
}

impl SliderControl {
    fn value_def() -> DependencyPropertyDefinition {
        DependencyPropertyDefinition::create::<Slider, u32>("Value")
    }

    fn max_value_def() -> DependencyPropertyDefinition {
        DependencyPropertyDefinition::create::<Slider, u32>("MaxValue")
    }

    fn new(service: Rc<RefCell<DataBindingService>>) -> Self {
        Self {
            scope: ScopedDependencyObject::new(service),
            value: TypedDependencyProperty::new(0),
            max_value: TypedDependencyProperty::new(100),
        }
    }

    fn set_value(&mut self, value: u32) -> bool {
        self.value
            .set(&self.scope, value, PropertyChangeReason::Modified)
    }
}

struct ProgressBarControl {
    scope: ScopedDependencyObject,
    percent: TypedDependencyProperty<u32>,
    caption: StringDependencyProperty,
}

impl ProgressBarControl {
    fn percent_def() -> DependencyPropertyDefinition {
        DependencyPropertyDefinition::create::<ProgressBar, u32>("Percent")
    }

    fn caption_def() -> DependencyPropertyDefinition {
        DependencyPropertyDefinition::create::<ProgressBar, String>("Caption")
    }

    fn new(service: Rc<RefCell<DataBindingService>>) -> Self {
        Self {
            scope: ScopedDependencyObject::new(service),
            percent: TypedDependencyProperty::new(0),
            caption: StringDependencyProperty::new(""),
        }
    }
}

fn main() {
    let service = Rc::new(RefCell::new(DataBindingService::new()));

    let mut slider = SliderControl::new(service.clone());
    let mut progress = ProgressBarControl::new(service.clone());

    // progress.percent = slider.value * 100 / slider.max_value
    let value_handle = slider
        .value
        .get_instance_handle_on_demand(&slider.scope, &SliderControl::value_def())
        .expect("value definition matches");
    let max_handle = slider
        .max_value
        .get_instance_handle_on_demand(&slider.scope, &SliderControl::max_value_def())
        .expect("max value definition matches");

    let percent_converter = Rc::new(MultiConverterBinding2::new(|value: &u32, max: &u32| {
        if *max == 0 { 0 } else { value * 100 / max }
    }));
    progress
        .percent
        .set_binding(
            &progress.scope,
            &ProgressBarControl::percent_def(),
            &Binding::with_multi_converter(percent_converter, &[value_handle, max_handle]),
        )
        .expect("percent binding is valid");

    // progress.caption = "<percent>%"
    let percent_handle = progress
        .percent
        .get_instance_handle_on_demand(&progress.scope, &ProgressBarControl::percent_def())
        .expect("percent definition matches");
    let caption_converter = Rc::new(ValueConverterBinding::new(|percent: &u32| {
        format!("{percent}%")
    }));
    progress
        .caption
        .set_binding(
            &progress.scope,
            &ProgressBarControl::caption_def(),
            &Binding::with_converter(caption_converter, percent_handle),
        )
        .expect("caption binding is valid");

    // A model object watched by an observer callback.
    let playlist = ScopedDataSourceObject::new(service.clone(), true);
    let playlist_handle = playlist.instance_handle_on_demand();
    let mut playlist_observer = DependencyObserverProperty::new(|source| {
        println!("  observer: data source {source:?} changed");
    });
    playlist_observer
        .set_binding(
            &progress.scope,
            &DependencyPropertyDefinition::create_observer::<ProgressBar>("PlaylistChanged"),
            &Binding::new(playlist_handle),
        )
        .expect("observer binding is valid");

    for (frame, value) in [0_u32, 25, 50, 50, 80].into_iter().enumerate() {
        let accepted = slider.set_value(value);
        if frame == 2 {
            playlist.changed(PropertyChangeReason::Modified);
        }
        service.borrow_mut().execute_changes();
        println!(
            "frame {frame}: slider={value} accepted={accepted} percent={} caption={}",
            progress.percent.get(),
            progress.caption.get(),
        );
    }
}
