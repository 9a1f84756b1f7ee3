// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for binding configuration and property materialization.

use core::any::TypeId;
use core::fmt;

/// A property definition does not match the property cell it was used with.
///
/// Raised at materialization time when a
/// [`DependencyPropertyDefinition`](crate::DependencyPropertyDefinition)
/// declares one value type but the typed property it is attached to stores
/// another. This is a configuration error in the control's property
/// declarations; it is never retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyPropertyDefinitionError {
    /// Name of the offending property definition.
    pub name: &'static str,
    /// The value type the definition declares.
    pub expected: TypeId,
    /// The value type of the property cell.
    pub actual: TypeId,
}

impl fmt::Display for DependencyPropertyDefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "property definition '{}' declares value type {:?} but the property stores {:?}",
            self.name, self.expected, self.actual
        )
    }
}

impl core::error::Error for DependencyPropertyDefinitionError {}

/// A binding operation was rejected.
///
/// All variants are configuration errors: the binding graph is left exactly
/// as it was before the failing call.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum BindingError {
    /// The requested binding would make the target depend on itself,
    /// directly or transitively.
    CyclicBinding,
    /// An endpoint handle did not resolve to a live instance.
    DeadInstance,
    /// Source and target value types differ and no converter bridges them.
    IncompatibleTypes {
        /// Value type of the target property.
        target: TypeId,
        /// Value type of the offending source property.
        source: TypeId,
    },
    /// The instance kinds cannot be combined this way (for example a
    /// container used where a property is required).
    IncompatibleProperties,
    /// The binding shape is not supported (source count out of range, a
    /// converter whose arity disagrees with the source list, or a converter
    /// on an observer binding).
    Unsupported,
    /// No property matching the requested definition was found.
    NotFound,
    /// Materializing the target property failed.
    Definition(DependencyPropertyDefinitionError),
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CyclicBinding => write!(f, "binding would create a cyclic dependency"),
            Self::DeadInstance => write!(f, "binding endpoint is not alive"),
            Self::IncompatibleTypes { target, source } => write!(
                f,
                "cannot bind source of type {source:?} to target of type {target:?} without a converter"
            ),
            Self::IncompatibleProperties => {
                write!(f, "instance kinds cannot be combined in this binding")
            }
            Self::Unsupported => write!(f, "unsupported binding shape"),
            Self::NotFound => write!(f, "no property matches the requested definition"),
            Self::Definition(inner) => write!(f, "{inner}"),
        }
    }
}

impl core::error::Error for BindingError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Definition(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<DependencyPropertyDefinitionError> for BindingError {
    fn from(inner: DependencyPropertyDefinitionError) -> Self {
        Self::Definition(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn definition_error_display_names_the_property() {
        let error = DependencyPropertyDefinitionError {
            name: "Width",
            expected: TypeId::of::<u32>(),
            actual: TypeId::of::<f32>(),
        };
        let text = error.to_string();
        assert!(text.contains("Width"));
    }

    #[test]
    fn binding_error_wraps_definition_error() {
        let inner = DependencyPropertyDefinitionError {
            name: "Height",
            expected: TypeId::of::<u32>(),
            actual: TypeId::of::<i64>(),
        };
        let error = BindingError::from(inner.clone());
        assert_eq!(error, BindingError::Definition(inner));
        assert!(core::error::Error::source(&error).is_some());
    }

    #[test]
    fn cyclic_error_display() {
        assert!(BindingError::CyclicBinding.to_string().contains("cyclic"));
    }
}
