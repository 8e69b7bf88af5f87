//! Diagnostic observers for binding and resolution events.
//!
//! Observers registered on a container see every bind, every resolved key
//! with its timing, resolution failures and disposal. Child containers
//! inherit the observers of their parent at creation.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::error::DiError;
use crate::key::DependencyKey;

/// Observer trait for container events.
///
/// Calls are made synchronously from inside container operations; keep
/// implementations cheap and do not call back into the container.
///
/// # Examples
///
/// ```
/// use bindgraph::{Container, DependencyKey, DiObserver};
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder {
///     resolved: RefCell<Vec<String>>,
/// }
///
/// impl DiObserver for Recorder {
///     fn resolving(&self, _key: &DependencyKey) {}
///
///     fn resolved(&self, key: &DependencyKey, _duration: Duration) {
///         self.resolved.borrow_mut().push(key.to_string());
///     }
/// }
///
/// let recorder = Rc::new(Recorder::default());
/// let container = Container::new();
/// container.add_observer(recorder.clone());
/// container.bind_instance(5u32).unwrap();
/// container.resolve_all().unwrap();
/// assert_eq!(*recorder.resolved.borrow(), vec!["u32".to_string()]);
/// ```
pub trait DiObserver {
    /// Called after keys were bound together.
    fn bound(&self, keys: &[DependencyKey]) {
        let _ = keys;
    }

    /// Called before a key's resolver runs.
    fn resolving(&self, key: &DependencyKey);

    /// Called once a key is resolved and injected.
    fn resolved(&self, key: &DependencyKey, duration: Duration);

    /// Called when resolving a key fails; the resolve pass is rolled back.
    fn resolve_failed(&self, key: &DependencyKey, error: &DiError) {
        let _ = (key, error);
    }

    /// Called once when the container is disposed.
    fn disposed(&self, container: Option<&str>) {
        let _ = container;
    }
}

/// Observer forwarding container events to `tracing`.
///
/// ```
/// use bindgraph::{Container, LoggingObserver};
/// use std::rc::Rc;
///
/// let container = Container::new();
/// container.add_observer(Rc::new(LoggingObserver::with_prefix("[app]")));
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self {
            prefix: "[bindgraph]".to_string(),
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn bound(&self, keys: &[DependencyKey]) {
        for key in keys {
            info!("{} bound {}", self.prefix, key);
        }
    }

    fn resolving(&self, key: &DependencyKey) {
        debug!("{} resolving {}", self.prefix, key);
    }

    fn resolved(&self, key: &DependencyKey, duration: Duration) {
        info!("{} resolved {} in {:?}", self.prefix, key, duration);
    }

    fn resolve_failed(&self, key: &DependencyKey, error: &DiError) {
        error!("{} failed to resolve {}: {}", self.prefix, key, error);
    }

    fn disposed(&self, container: Option<&str>) {
        info!("{} disposed container {}", self.prefix, container.unwrap_or("<unnamed>"));
    }
}

/// Registered observers of one container.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    observers: Vec<Rc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Rc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn bound(&self, keys: &[DependencyKey]) {
        for observer in &self.observers {
            observer.bound(keys);
        }
    }

    pub(crate) fn resolving(&self, key: &DependencyKey) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    pub(crate) fn resolved(&self, key: &DependencyKey, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    pub(crate) fn resolve_failed(&self, key: &DependencyKey, error: &DiError) {
        for observer in &self.observers {
            observer.resolve_failed(key, error);
        }
    }

    pub(crate) fn disposed(&self, container: Option<&str>) {
        for observer in &self.observers {
            observer.disposed(container);
        }
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.observers.len())
            .finish()
    }
}
