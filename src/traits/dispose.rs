//! Lifecycle traits for instances owned by a container.

use crate::container::Container;
use crate::error::DiResult;

/// Trait for synchronous resource disposal.
///
/// Instances expose it through [`Injectable::as_dispose`](crate::Injectable::as_dispose).
/// When a container is disposed, each live resolved instance is disposed
/// exactly once, dependents before their dependencies.
///
/// # Examples
///
/// ```
/// use bindgraph::{Container, Dispose, Injectable};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// struct Cache {
///     flushed: Rc<Cell<bool>>,
/// }
///
/// impl Dispose for Cache {
///     fn dispose(&self) {
///         self.flushed.set(true);
///     }
/// }
///
/// impl Injectable for Cache {
///     fn as_dispose(&self) -> Option<&dyn Dispose> {
///         Some(self)
///     }
/// }
///
/// let flushed = Rc::new(Cell::new(false));
/// let container = Container::new();
/// container.bind_instance(Cache { flushed: flushed.clone() }).unwrap();
/// container.resolve_all().unwrap();
/// container.dispose();
/// assert!(flushed.get());
/// ```
pub trait Dispose: 'static {
    /// Release whatever the instance holds.
    fn dispose(&self);
}

/// Post-resolution hook.
///
/// Runs once per instance after the resolve pass that produced it has
/// injected every resolved instance, so the hook can rely on its fields.
pub trait Initialize: 'static {
    fn initialize(&self, container: &Container<'_>) -> DiResult<()>;
}
