//! Resolvers: the strategies that produce an instance for a bound key.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::container::Container;
use crate::error::DiResult;
use crate::injector::{Args, ErasedInjector, Injector};
use crate::internal::DisposeBag;
use crate::key::{DependencyKey, TypeKey};
use crate::traits::Injectable;

pub mod shared;

pub use shared::{RefCounter, SharedInstanceCache};

/// A resolved object together with its lifecycle hooks and injector.
///
/// Cloning shares the object.
#[derive(Clone)]
pub struct Instance {
    object: Rc<dyn Any>,
    hooks: Rc<dyn Injectable>,
    concrete: TypeKey,
    injector: Rc<dyn ErasedInjector>,
    initialized: Rc<Cell<bool>>,
}

impl Instance {
    pub fn new<T: Injectable>(value: Rc<T>, injector: Rc<Injector<T>>) -> Self {
        Instance {
            object: value.clone(),
            hooks: value,
            concrete: TypeKey::of::<T>(),
            injector,
            initialized: Rc::new(Cell::new(false)),
        }
    }

    /// Runtime type of the object.
    pub fn concrete_type(&self) -> TypeKey {
        self.concrete
    }

    pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
        self.object.clone().downcast::<T>().ok()
    }

    pub fn is_alive(&self) -> bool {
        self.hooks.is_alive()
    }

    /// Whether both handles refer to the same object.
    pub fn same_object(&self, other: &Instance) -> bool {
        self.address() == other.address()
    }

    pub(crate) fn address(&self) -> *const () {
        Rc::as_ptr(&self.object) as *const ()
    }

    pub(crate) fn inject_fields(&self, container: &Container<'_>) -> DiResult<()> {
        self.injector.inject_any(&*self.object, container)
    }

    /// Runs the initialize hook unless it already succeeded for this object.
    pub(crate) fn initialize(&self, container: &Container<'_>) -> DiResult<()> {
        if self.initialized.get() || !self.is_alive() {
            return Ok(());
        }
        if let Some(hook) = self.hooks.as_initialize() {
            hook.initialize(container)?;
        }
        self.initialized.set(true);
        Ok(())
    }

    pub(crate) fn dispose(&self) {
        if !self.is_alive() {
            return;
        }
        if let Some(disposable) = self.hooks.as_dispose() {
            disposable.dispose();
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.concrete.name())
            .field("address", &self.address())
            .finish()
    }
}

/// A factory object that produces `T` on demand.
///
/// The factory itself is field-injected before every production, so it can
/// depend on anything the container has resolved.
pub trait InstanceFactory<T>: Injectable {
    fn create_instance(&self) -> DiResult<T>;
}

/// User-supplied resolution strategy, bound with
/// [`Binder::to_custom_resolver`](crate::Binder::to_custom_resolver).
pub trait ResolveInstance: 'static {
    /// Produces the instance for one bound key. Use
    /// [`Container::instance_of`] to wrap a value.
    fn resolve(&mut self, container: &Container<'_>) -> DiResult<Instance>;

    /// Called once the last key using this resolver is unbound.
    fn dispose(&mut self) {}
}

/// Which strategy backs a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolverKind {
    Instance,
    NewInstance,
    Function,
    ExternalFactory,
    Custom,
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolverKind::Instance => "instance",
            ResolverKind::NewInstance => "new instance",
            ResolverKind::Function => "function",
            ResolverKind::ExternalFactory => "external factory",
            ResolverKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

type Produce = Box<dyn Fn(&Container<'_>) -> DiResult<Instance>>;

pub(crate) struct NewInstanceResolver {
    create: Produce,
    cached: Option<Instance>,
}

impl NewInstanceResolver {
    fn resolve(&mut self, container: &Container<'_>) -> DiResult<Instance> {
        if let Some(instance) = &self.cached {
            return Ok(instance.clone());
        }
        let instance = (self.create)(container)?;
        self.cached = Some(instance.clone());
        Ok(instance)
    }
}

pub(crate) struct ExternalFactoryResolver {
    factory: Instance,
    produce: Produce,
}

pub(crate) struct SharedInstanceResolver {
    key: DependencyKey,
    inner: Box<Resolver>,
}

impl SharedInstanceResolver {
    fn resolve(&mut self, container: &Container<'_>) -> DiResult<Instance> {
        let cached = container.shared_instances().borrow_mut().acquire(&self.key);
        if let Some(instance) = cached {
            return Ok(instance);
        }
        let instance = self.inner.resolve(container)?;
        container
            .shared_instances()
            .borrow_mut()
            .insert(self.key.clone(), instance.clone());
        Ok(instance)
    }
}

/// The resolution strategies a binding can use.
pub(crate) enum Resolver {
    /// A pre-existing instance
    Instance(Instance),
    /// Constructed once through the implementation's injector, then cached
    NewInstance(NewInstanceResolver),
    /// Produced by a function on every resolution
    Function(Produce),
    /// Produced by an injected factory object on every resolution
    ExternalFactory(ExternalFactoryResolver),
    /// Delegates creation to its inner resolver once per shared key
    Shared(SharedInstanceResolver),
    Custom(Box<dyn ResolveInstance>),
}

impl Resolver {
    pub(crate) fn instance<T: Injectable>(value: Rc<T>, injector: Rc<Injector<T>>) -> Self {
        Resolver::Instance(Instance::new(value, injector))
    }

    pub(crate) fn new_instance<T: Injectable>(injector: Rc<Injector<T>>) -> Self {
        Resolver::NewInstance(NewInstanceResolver {
            create: Box::new(move |container| {
                let value = injector.create_instance(container, Args::new())?;
                Ok(Instance::new(Rc::new(value), injector.clone()))
            }),
            cached: None,
        })
    }

    pub(crate) fn function<T, F>(injector: Rc<Injector<T>>, function: F) -> Self
    where
        T: Injectable,
        F: Fn() -> T + 'static,
    {
        Resolver::Function(Box::new(move |_| {
            Ok(Instance::new(Rc::new(function()), injector.clone()))
        }))
    }

    pub(crate) fn external_factory<T, F>(
        factory: Rc<F>,
        factory_injector: Rc<Injector<F>>,
        product_injector: Rc<Injector<T>>,
    ) -> Self
    where
        T: Injectable,
        F: InstanceFactory<T>,
    {
        let handle = Instance::new(factory.clone(), factory_injector.clone());
        Resolver::ExternalFactory(ExternalFactoryResolver {
            factory: handle,
            produce: Box::new(move |container| {
                factory_injector.inject_fields(&factory, container)?;
                let product = factory.create_instance()?;
                Ok(Instance::new(Rc::new(product), product_injector.clone()))
            }),
        })
    }

    pub(crate) fn shared(key: DependencyKey, inner: Resolver) -> Self {
        Resolver::Shared(SharedInstanceResolver {
            key,
            inner: Box::new(inner),
        })
    }

    pub(crate) fn custom(resolver: impl ResolveInstance) -> Self {
        Resolver::Custom(Box::new(resolver))
    }

    pub(crate) fn resolve(&mut self, container: &Container<'_>) -> DiResult<Instance> {
        match self {
            Resolver::Instance(instance) => Ok(instance.clone()),
            Resolver::NewInstance(resolver) => resolver.resolve(container),
            Resolver::Function(produce) => produce(container),
            Resolver::ExternalFactory(resolver) => (resolver.produce)(container),
            Resolver::Shared(resolver) => resolver.resolve(container),
            Resolver::Custom(resolver) => resolver.resolve(container),
        }
    }

    /// Gives back the reference one resolved key held.
    pub(crate) fn release(&mut self, container: &Container<'_>) {
        if let Resolver::Shared(resolver) = self {
            container
                .shared_instances()
                .borrow_mut()
                .release(&resolver.key);
        }
    }

    /// Hands owned disposables to `bag`; custom resolvers dispose directly.
    pub(crate) fn dispose(&mut self, bag: &mut DisposeBag) {
        match self {
            Resolver::ExternalFactory(resolver) => bag.push(resolver.factory.clone()),
            Resolver::Shared(resolver) => resolver.inner.dispose(bag),
            Resolver::Custom(resolver) => resolver.dispose(),
            Resolver::Instance(_) | Resolver::NewInstance(_) | Resolver::Function(_) => {}
        }
    }

    pub(crate) fn kind(&self) -> ResolverKind {
        match self {
            Resolver::Instance(_) => ResolverKind::Instance,
            Resolver::NewInstance(_) => ResolverKind::NewInstance,
            Resolver::Function(_) => ResolverKind::Function,
            Resolver::ExternalFactory(_) => ResolverKind::ExternalFactory,
            Resolver::Shared(resolver) => resolver.inner.kind(),
            Resolver::Custom(_) => ResolverKind::Custom,
        }
    }
}
