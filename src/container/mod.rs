//! The dependency container.
//!
//! A [`Container`] owns a binding table (key to resolver), a table of
//! resolved values, and the dependency graph relating bound keys to their
//! implementations and the implementations to their own dependencies.
//! Binding marks the container stale; the next lookup runs one resolve
//! pass that walks the graph in dependency order and resolves, injects and
//! records every bound key that is not resolved yet.
//!
//! Containers form a tree: a child sees everything its ancestors resolved,
//! while its own bindings stay invisible to them.

use std::any::Any;
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, trace, warn};

use crate::config::ContainerOptions;
use crate::descriptors::BindingDescriptor;
use crate::error::{DiError, DiResult};
use crate::graph::DependencyGraph;
use crate::injector::InjectorRegistry;
use crate::internal::DisposeBag;
use crate::key::DependencyKey;
use crate::lifetime::{Phase, Sharing};
use crate::observer::{DiObserver, Observers};
use crate::resolver::{Instance, Resolver, SharedInstanceCache};
use crate::traits::Injectable;

pub mod binder;
mod binding;
mod injecting;

pub use binder::{AddInterface, Binder, Iface, ImplementedBy, InterfaceList};

pub(crate) type CastFn = fn(&Instance) -> Option<Rc<dyn Any>>;

/// One bound key.
pub(crate) struct Binding {
    pub(crate) resolver: Rc<RefCell<Resolver>>,
    pub(crate) cast: CastFn,
    pub(crate) implementation: DependencyKey,
    pub(crate) sharing: Sharing,
    pub(crate) companion: Option<DependencyKey>,
}

/// A resolved key: the instance and its view as the key's type.
struct ResolvedEntry {
    instance: Instance,
    value: Rc<dyn Any>,
}

/// Dependency container.
///
/// All operations take `&self`; state lives behind `RefCell`s and no
/// borrow is held while user code (constructors, factories, hooks) runs.
/// The container is single-threaded.
///
/// # Examples
///
/// ```rust
/// use bindgraph::{implements, Container, Injectable};
///
/// trait Greeter {
///     fn greet(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".to_string()
///     }
/// }
///
/// impl Injectable for English {
///     fn describe(d: &mut bindgraph::TypeDescriptor<Self>) {
///         d.default_constructor();
///     }
/// }
///
/// implements!(English => dyn Greeter);
///
/// let container = Container::new();
/// container.bind::<dyn Greeter>().to_new_instance::<English>().unwrap();
///
/// let greeter = container.get::<dyn Greeter>().unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// ```
pub struct Container<'p> {
    parent: Option<&'p Container<'p>>,
    options: ContainerOptions,
    injectors: Rc<InjectorRegistry>,
    bindings: RefCell<HashMap<DependencyKey, Binding>>,
    resolved: RefCell<HashMap<DependencyKey, ResolvedEntry>>,
    resolution_order: RefCell<Vec<DependencyKey>>,
    graph: RefCell<DependencyGraph>,
    shared: RefCell<SharedInstanceCache>,
    observers: RefCell<Observers>,
    phase: Cell<Phase>,
    /// Bumped by every bind, so a pass can tell whether it raced one.
    generation: Cell<u64>,
    resolving: Cell<bool>,
    disposed: Cell<bool>,
}

impl Container<'static> {
    /// Unnamed root container with default options.
    pub fn new() -> Self {
        Container::with_options(ContainerOptions::default())
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Container::with_options(ContainerOptions::named(name))
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        let injectors = Rc::new(InjectorRegistry::new(options.constructor_policy));
        Container::assemble(None, options, injectors, Observers::default())
    }
}

impl Default for Container<'static> {
    fn default() -> Self {
        Container::new()
    }
}

impl<'p> Container<'p> {
    fn assemble(
        parent: Option<&'p Container<'p>>,
        options: ContainerOptions,
        injectors: Rc<InjectorRegistry>,
        observers: Observers,
    ) -> Self {
        Container {
            parent,
            options,
            injectors,
            bindings: RefCell::new(HashMap::new()),
            resolved: RefCell::new(HashMap::new()),
            resolution_order: RefCell::new(Vec::new()),
            graph: RefCell::new(DependencyGraph::new()),
            shared: RefCell::new(SharedInstanceCache::new()),
            observers: RefCell::new(observers),
            phase: Cell::new(Phase::Binding),
            generation: Cell::new(0),
            resolving: Cell::new(false),
            disposed: Cell::new(false),
        }
    }

    /// Creates a child that falls back to this container for lookups.
    ///
    /// The child shares this container's injector registry, options and
    /// observers. The borrow keeps the parent alive for the child's lifetime.
    pub fn create_child_container(&self, name: Option<&str>) -> DiResult<Container<'_>> {
        self.ensure_live("create a child of")?;
        let options = ContainerOptions {
            name: name.map(str::to_owned),
            ..self.options.clone()
        };
        let observers = self.observers.borrow().clone();
        debug!(parent = %self, child = ?name, "created child container");
        Ok(Container::assemble(
            Some(self),
            options,
            self.injectors.clone(),
            observers,
        ))
    }

    pub fn name(&self) -> Option<&str> {
        self.options.name.as_deref()
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    pub fn parent(&self) -> Option<&'p Container<'p>> {
        self.parent
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// The injector registry, shared across the container tree.
    pub fn injectors(&self) -> &InjectorRegistry {
        &self.injectors
    }

    pub fn add_observer(&self, observer: Rc<dyn DiObserver>) {
        self.observers.borrow_mut().add(observer);
    }

    /// Whether `T` is bound here or in an ancestor.
    pub fn is_bound<T: ?Sized + 'static>(&self) -> bool {
        self.is_bound_key(&DependencyKey::of::<T>())
    }

    pub fn is_bound_key(&self, key: &DependencyKey) -> bool {
        self.bindings.borrow().contains_key(key)
            || self.parent.map_or(false, |parent| parent.is_bound_key(key))
    }

    /// References currently held on the shared instance under `key`.
    pub fn shared_ref_count(&self, key: &DependencyKey) -> usize {
        self.shared.borrow().ref_count(key)
    }

    /// Wraps a value so a custom resolver can return it.
    pub fn instance_of<T: Injectable>(&self, value: Rc<T>) -> DiResult<Instance> {
        let injector = self.injectors.get_or_create::<T>()?;
        Ok(Instance::new(value, injector))
    }

    /// The instance for `T`, resolving pending bindings first.
    pub fn get<T: ?Sized + 'static>(&self) -> DiResult<Rc<T>> {
        self.get_key(&DependencyKey::of::<T>())
    }

    pub fn get_named<T: ?Sized + 'static>(&self, name: impl Into<Cow<'static, str>>) -> DiResult<Rc<T>> {
        self.get_key(&DependencyKey::named::<T>(name))
    }

    /// Like [`get`](Container::get), but absence is `Ok(None)`.
    pub fn try_get<T: ?Sized + 'static>(&self) -> DiResult<Option<Rc<T>>> {
        self.try_get_key(&DependencyKey::of::<T>())
    }

    pub fn try_get_named<T: ?Sized + 'static>(
        &self,
        name: impl Into<Cow<'static, str>>,
    ) -> DiResult<Option<Rc<T>>> {
        self.try_get_key(&DependencyKey::named::<T>(name))
    }

    fn get_key<T: ?Sized + 'static>(&self, key: &DependencyKey) -> DiResult<Rc<T>> {
        self.try_get_key(key)?
            .ok_or_else(|| DiError::DependencyNotFound(key.clone()))
    }

    fn try_get_key<T: ?Sized + 'static>(&self, key: &DependencyKey) -> DiResult<Option<Rc<T>>> {
        self.ensure_live("retrieve from")?;
        if !self.is_bound_key(key) {
            return Ok(None);
        }
        self.resolve_all()?;
        let value = self.lookup_resolved(key)?;
        Ok(value.and_then(|value| value.downcast_ref::<Rc<T>>().cloned()))
    }

    /// Resolved value for `key` here or in the nearest ancestor that has
    /// one. Never triggers a resolve pass.
    pub(crate) fn lookup_resolved(&self, key: &DependencyKey) -> DiResult<Option<Rc<dyn Any>>> {
        self.ensure_live("retrieve from")?;
        if let Some(value) = self.local_resolved(key) {
            return Ok(Some(value));
        }
        match self.parent {
            Some(parent) => parent.lookup_resolved(key),
            None => Ok(None),
        }
    }

    fn local_resolved(&self, key: &DependencyKey) -> Option<Rc<dyn Any>> {
        let resolved = self.resolved.borrow();
        let entry = resolved.get(key)?;
        if !entry.instance.is_alive() {
            warn!(%key, container = %self, "resolved instance is no longer alive");
            return None;
        }
        Some(entry.value.clone())
    }

    /// Resolves every bound key that is not resolved yet.
    ///
    /// Ancestors resolve first. Bindings made while the pass runs (from a
    /// resolver or an initializer) are resolved by a further pass before
    /// this returns. A pass that fails is rolled back, leaving the
    /// container in the `Binding` phase.
    pub fn resolve_all(&self) -> DiResult<()> {
        self.ensure_live("resolve")?;
        if let Some(parent) = self.parent {
            parent.resolve_all()?;
        }
        if self.phase.get() == Phase::Resolved || self.resolving.get() {
            return Ok(());
        }

        self.resolving.set(true);
        let result = self.resolve_until_settled();
        self.resolving.set(false);
        result
    }

    fn resolve_until_settled(&self) -> DiResult<()> {
        loop {
            let generation = self.generation.get();
            self.resolve_pending()?;
            self.ensure_live("resolve")?;
            if self.generation.get() == generation {
                self.phase.set(Phase::Resolved);
                return Ok(());
            }
            trace!(container = %self, "bindings changed during resolve pass, resolving again");
        }
    }

    fn resolve_pending(&self) -> DiResult<()> {
        let order = {
            let mut graph = self.graph.borrow_mut();
            if let Some(cycle) = graph.find_cycle() {
                return Err(cycle.into_error());
            }
            graph.sorted()?
        };

        let mut fresh: Vec<DependencyKey> = Vec::new();
        for key in order.iter() {
            if self.resolved.borrow().contains_key(key) {
                continue;
            }
            let binding = self
                .bindings
                .borrow()
                .get(key)
                .map(|binding| (binding.resolver.clone(), binding.cast));
            let (resolver, cast) = match binding {
                Some(binding) => binding,
                None => continue,
            };

            match self.resolve_binding(key, &resolver, cast) {
                Ok(entry) => {
                    // The container may have dropped this binding while the resolver ran
                    let still_bound = self
                        .bindings
                        .borrow()
                        .get(key)
                        .map_or(false, |binding| Rc::ptr_eq(&binding.resolver, &resolver));
                    if !still_bound {
                        if let Ok(mut resolver) = resolver.try_borrow_mut() {
                            resolver.release(self);
                        }
                        continue;
                    }
                    self.resolved.borrow_mut().insert(key.clone(), entry);
                    fresh.push(key.clone());
                }
                Err(error) => {
                    self.observers().resolve_failed(key, &error);
                    self.discard(&fresh);
                    return Err(error);
                }
            }
        }

        if self.options.run_initializers {
            for key in &fresh {
                let instance = self
                    .resolved
                    .borrow()
                    .get(key)
                    .map(|entry| entry.instance.clone());
                if let Some(instance) = instance {
                    if let Err(error) = instance.initialize(self) {
                        self.observers().resolve_failed(key, &error);
                        self.discard(&fresh);
                        return Err(error);
                    }
                }
            }
        }

        debug!(container = %self, resolved = fresh.len(), "resolve pass complete");
        self.resolution_order.borrow_mut().extend(fresh);
        Ok(())
    }

    fn resolve_binding(
        &self,
        key: &DependencyKey,
        resolver: &Rc<RefCell<Resolver>>,
        cast: CastFn,
    ) -> DiResult<ResolvedEntry> {
        let observers = self.observers();
        observers.resolving(key);
        let started = Instant::now();

        let instance = resolver
            .try_borrow_mut()
            .map_err(|_| {
                DiError::configuration(format!("resolver for {} re-entered while resolving", key))
            })?
            .resolve(self)?;

        let value = match self.prepare(key, &instance, cast) {
            Ok(value) => value,
            Err(error) => {
                if let Ok(mut resolver) = resolver.try_borrow_mut() {
                    resolver.release(self);
                }
                return Err(error);
            }
        };

        let elapsed = started.elapsed();
        observers.resolved(key, elapsed);
        trace!(%key, implementation = %instance.concrete_type(), ?elapsed, "resolved");
        Ok(ResolvedEntry { instance, value })
    }

    /// Injects a freshly resolved instance and views it as the key's type.
    fn prepare(&self, key: &DependencyKey, instance: &Instance, cast: CastFn) -> DiResult<Rc<dyn Any>> {
        if !instance.is_alive() {
            return Err(DiError::configuration(format!(
                "cannot inject into dead instance of {} resolved for {}",
                instance.concrete_type(),
                key
            )));
        }
        instance.inject_fields(self)?;

        cast(instance).ok_or_else(|| {
            DiError::configuration(format!(
                "{} resolved for {} is not the bound implementation",
                instance.concrete_type(),
                key
            ))
        })
    }

    /// Drops entries of a failed pass and their shared references.
    fn discard(&self, keys: &[DependencyKey]) {
        for key in keys {
            self.resolved.borrow_mut().remove(key);
            let resolver = self
                .bindings
                .borrow()
                .get(key)
                .map(|binding| binding.resolver.clone());
            if let Some(resolver) = resolver {
                if let Ok(mut resolver) = resolver.try_borrow_mut() {
                    resolver.release(self);
                }
            }
        }
    }

    /// Disposes every live resolved instance once, dependents first, then
    /// clears all tables. Later calls do nothing.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }

        let mut bag = DisposeBag::default();
        let bindings: Vec<Binding> = self
            .bindings
            .borrow_mut()
            .drain()
            .map(|(_, binding)| binding)
            .collect();
        let mut seen: Vec<Rc<RefCell<Resolver>>> = Vec::new();
        for binding in bindings {
            if seen.iter().any(|r| Rc::ptr_eq(r, &binding.resolver)) {
                continue;
            }
            if let Ok(mut resolver) = binding.resolver.try_borrow_mut() {
                resolver.dispose(&mut bag);
            }
            seen.push(binding.resolver);
        }

        {
            let order = self.resolution_order.take();
            let mut resolved = self.resolved.borrow_mut();
            for key in order {
                if let Some(entry) = resolved.remove(&key) {
                    bag.push(entry.instance);
                }
            }
            resolved.clear();
        }

        if !bag.is_empty() {
            debug!(container = %self, disposables = bag.len(), "disposing container");
            bag.dispose_all();
        }

        self.shared.borrow_mut().clear();
        self.graph.borrow_mut().clear();
        self.observers().disposed(self.name());
    }

    pub(crate) fn ensure_live(&self, action: &str) -> DiResult<()> {
        if self.disposed.get() {
            Err(DiError::configuration(format!(
                "cannot {} disposed {}",
                action, self
            )))
        } else {
            Ok(())
        }
    }

    pub(crate) fn shared_instances(&self) -> &RefCell<SharedInstanceCache> {
        &self.shared
    }

    pub(crate) fn observers(&self) -> Observers {
        self.observers.borrow().clone()
    }

    /// Snapshot of this container's own bindings, ordered by key.
    pub fn binding_descriptors(&self) -> Vec<BindingDescriptor> {
        let bindings = self.bindings.borrow();
        let resolved = self.resolved.borrow();
        let mut descriptors: Vec<BindingDescriptor> = bindings
            .iter()
            .map(|(key, binding)| BindingDescriptor {
                key: key.clone(),
                implementation: binding.implementation.type_key(),
                resolver: binding.resolver.borrow().kind(),
                sharing: binding.sharing,
                resolved: resolved.contains_key(key),
            })
            .collect();
        descriptors.sort_by(|a, b| a.key.cmp(&b.key));
        descriptors
    }
}

impl Drop for Container<'_> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Display for Container<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "container '{}'", name),
            None => f.write_str("container"),
        }
    }
}

impl fmt::Debug for Container<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name())
            .field("has_parent", &self.parent.is_some())
            .field("phase", &self.phase.get())
            .field("bindings", &self.bindings.borrow().len())
            .field("resolved", &self.resolved.borrow().len())
            .field("observers", &self.observers.borrow().len())
            .field("disposed", &self.disposed.get())
            .finish()
    }
}
