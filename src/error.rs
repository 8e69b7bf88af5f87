//! Error types for the dependency injection container.

use thiserror::Error;

use crate::key::DependencyKey;

/// Dependency injection errors.
///
/// Every fallible container, graph and introspection operation reports one
/// of these. None of them are retried internally.
///
/// # Examples
///
/// ```rust
/// use bindgraph::{Container, DependencyKey, DiError};
///
/// let container = Container::new();
/// match container.get::<String>() {
///     Err(DiError::DependencyNotFound(key)) => {
///         assert_eq!(key, DependencyKey::of::<String>());
///     }
///     other => panic!("unexpected: {:?}", other.map(|_| ())),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// Invalid use of the container or of a type description
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// One or more keys of a bind request are already bound
    #[error("Dependency already bound: {}", join_keys(.0))]
    DuplicateBinding(Vec<DependencyKey>),
    /// The edge `from -> to` would close a cycle detected at `at`
    #[error("Cyclic dependency: adding {from} -> {to} closes a cycle at {at}")]
    CyclicDependency {
        from: DependencyKey,
        to: DependencyKey,
        at: DependencyKey,
    },
    /// Nothing is bound or resolved for the key
    #[error("Dependency not found: {0}")]
    DependencyNotFound(DependencyKey),
    /// A declared dependency of `target` could not be supplied
    #[error("Missing dependency {key} while injecting {target}")]
    MissingDependency {
        target: &'static str,
        key: DependencyKey,
    },
    /// No constructor of `target` takes the supplied argument types
    #[error("No constructor of {target} accepts ({})", .supplied.join(", "))]
    NoMatchingConstructor {
        target: &'static str,
        supplied: Vec<&'static str>,
    },
}

impl DiError {
    /// Shorthand for [`DiError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        DiError::Configuration(message.into())
    }

    /// The key this error is about, when there is a single one.
    pub fn key(&self) -> Option<&DependencyKey> {
        match self {
            DiError::CyclicDependency { at, .. } => Some(at),
            DiError::DependencyNotFound(key) | DiError::MissingDependency { key, .. } => Some(key),
            DiError::DuplicateBinding(keys) if keys.len() == 1 => keys.first(),
            _ => None,
        }
    }
}

fn join_keys(keys: &[DependencyKey]) -> String {
    keys.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for DI operations.
pub type DiResult<T> = Result<T, DiError>;
