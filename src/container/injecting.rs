//! Building and injecting objects that are not bound.

use tracing::trace;

use super::Container;
use crate::error::DiResult;
use crate::injector::Args;
use crate::traits::Injectable;

impl<'p> Container<'p> {
    /// Constructs a `T` with its no-argument constructor and injects its
    /// fields. The instance is not bound or tracked.
    ///
    /// Pending bindings are resolved first.
    pub fn create_injected_instance<T: Injectable>(&self) -> DiResult<T> {
        self.create_injected_instance_with(Args::new())
    }

    /// Like [`create_injected_instance`](Self::create_injected_instance),
    /// selecting the constructor whose non-injected parameters match `args`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use bindgraph::{Args, ConstructorShape, Container, Inject, Injectable, TypeDescriptor};
    ///
    /// struct Pool {
    ///     url: Inject<String>,
    ///     size: usize,
    /// }
    ///
    /// impl Injectable for Pool {
    ///     fn describe(d: &mut TypeDescriptor<Self>) {
    ///         d.field(|p| &p.url)
    ///             .constructor(ConstructorShape::new().arg::<usize>(), |args| {
    ///                 Ok(Pool { url: Inject::new(), size: args.arg()? })
    ///             });
    ///     }
    /// }
    ///
    /// let container = Container::new();
    /// container.bind_instance(String::from("postgres://db")).unwrap();
    ///
    /// let pool: Pool = container
    ///     .create_injected_instance_with(Args::new().with(4usize))
    ///     .unwrap();
    /// assert_eq!(pool.size, 4);
    /// assert_eq!(pool.url.get().unwrap().as_str(), "postgres://db");
    /// ```
    pub fn create_injected_instance_with<T: Injectable>(&self, args: Args) -> DiResult<T> {
        self.ensure_live("create an instance from")?;
        self.resolve_all()?;
        let injector = self.injectors.get_or_create::<T>()?;
        let instance = injector.create_instance(self, args)?;
        injector.inject_fields(&instance, self)?;
        trace!(container = %self, target = injector.target(), "created injected instance");
        Ok(instance)
    }

    /// Injects the fields of an existing object from what this container
    /// and its ancestors have already resolved.
    ///
    /// Unlike lookups, this does not run a resolve pass.
    pub fn inject_into<T: Injectable>(&self, target: &T) -> DiResult<()> {
        self.ensure_live("inject from")?;
        let injector = self.injectors.get_or_create::<T>()?;
        injector.inject_fields(target, self)
    }
}
