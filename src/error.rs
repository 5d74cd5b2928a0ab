//! Error types for the dependency injection container.

use crate::key::Key;

/// Dependency injection errors.
///
/// Every public registration, decoration and resolution operation reports
/// failures with one of these variants. None of them is retried and none is
/// fatal: the caller decides what to do.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Container, DiError, Resolver};
///
/// let container = Container::new();
/// match container.get::<String>() {
///     Err(DiError::FactoryNotRegistered { type_name, name }) => {
///         assert_eq!(type_name, "alloc::string::String");
///         assert!(name.is_empty());
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiError {
    /// Resolution requested for an unregistered `(type, name)`.
    #[error("factory not registered: {}", describe(.type_name, .name))]
    FactoryNotRegistered {
        type_name: &'static str,
        name: String,
    },
    /// A second registration for the same `(type, name)` in a reachable namespace.
    #[error("factory already registered: {}", describe(.type_name, .name))]
    FactoryAlreadyRegistered {
        type_name: &'static str,
        name: String,
    },
    /// `decorate` was called before any factory exists for the type.
    #[error("a factory needs to be registered before a decorator: {type_name}")]
    DecoratorBeforeFactory { type_name: &'static str },
    /// `decorate` was called for a concrete (non-capability) type.
    #[error("item to decorate must be an interface: {type_name}")]
    DecoratedMustBeInterface { type_name: &'static str },
}

fn describe(type_name: &str, name: &str) -> String {
    if name.is_empty() {
        type_name.to_string()
    } else {
        format!("{}[{}]", type_name, name)
    }
}

impl DiError {
    pub(crate) fn not_registered(key: &Key) -> Self {
        DiError::FactoryNotRegistered {
            type_name: key.display_name(),
            name: key.name().to_string(),
        }
    }

    pub(crate) fn already_registered(key: &Key) -> Self {
        DiError::FactoryAlreadyRegistered {
            type_name: key.display_name(),
            name: key.name().to_string(),
        }
    }
}

/// Result type for DI operations.
pub type DiResult<T> = Result<T, DiError>;
