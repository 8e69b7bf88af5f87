//! Fluent binding surface.
//!
//! `container.bind::<dyn A>()` starts a [`Binder`] for one interface;
//! [`Binder::and`] adds more, up to five, all resolved from the same
//! binding. A terminal method (`to_instance`, `to_new_instance`, ...) then
//! installs the binding.

use std::any::Any;
use std::borrow::Cow;
use std::marker::PhantomData;
use std::rc::Rc;

use super::binding::{BindingPlan, FactoryPlan};
use super::{CastFn, Container};
use crate::error::DiResult;
use crate::injector::Injector;
use crate::key::{DependencyKey, TypeKey};
use crate::lifetime::Sharing;
use crate::resolver::{Instance, InstanceFactory, ResolveInstance, Resolver};
use crate::traits::{Injectable, Upcast};

/// Type-level marker for one bound interface.
pub struct Iface<I: ?Sized + 'static>(PhantomData<I>);

/// A list of 1 to 5 interfaces, as a tuple of [`Iface`] markers.
pub trait InterfaceList: 'static {
    const LEN: usize;

    /// The keys of every interface, all with the same qualifier.
    fn keys(qualifier: &Option<Cow<'static, str>>) -> Vec<DependencyKey>;
}

/// Implemented for an interface list when `Impl` upcasts to every member.
pub trait ImplementedBy<Impl>: InterfaceList {
    #[doc(hidden)]
    fn casts() -> Vec<CastFn>;
}

/// Appends interface `I` to a list.
pub trait AddInterface<I: ?Sized + 'static>: InterfaceList {
    type Output: InterfaceList;
}

fn cast_view<Impl, I>(instance: &Instance) -> Option<Rc<dyn Any>>
where
    Impl: Upcast<I>,
    I: ?Sized + 'static,
{
    let concrete = instance.downcast::<Impl>()?;
    Some(Rc::new(<Impl as Upcast<I>>::upcast(concrete)) as Rc<dyn Any>)
}

fn factory_view<F, Impl>(instance: &Instance) -> Option<Rc<dyn Any>>
where
    F: InstanceFactory<Impl>,
    Impl: 'static,
{
    let factory: Rc<dyn InstanceFactory<Impl>> = instance.downcast::<F>()?;
    Some(Rc::new(factory) as Rc<dyn Any>)
}

macro_rules! interface_list {
    ($len:expr; $($name:ident),+) => {
        impl<$($name: ?Sized + 'static),+> InterfaceList for ($(Iface<$name>,)+) {
            const LEN: usize = $len;

            fn keys(qualifier: &Option<Cow<'static, str>>) -> Vec<DependencyKey> {
                vec![$(DependencyKey::new(TypeKey::of::<$name>(), qualifier.clone())),+]
            }
        }

        impl<Impl, $($name: ?Sized + 'static),+> ImplementedBy<Impl> for ($(Iface<$name>,)+)
        where
            Impl: 'static $(+ Upcast<$name>)+,
        {
            fn casts() -> Vec<CastFn> {
                vec![$(cast_view::<Impl, $name> as CastFn),+]
            }
        }
    };
}

interface_list!(1; A);
interface_list!(2; A, B);
interface_list!(3; A, B, C);
interface_list!(4; A, B, C, D);
interface_list!(5; A, B, C, D, E);

macro_rules! add_interface {
    ($($name:ident),+) => {
        impl<$($name: ?Sized + 'static,)+ Next: ?Sized + 'static> AddInterface<Next> for ($(Iface<$name>,)+) {
            type Output = ($(Iface<$name>,)+ Iface<Next>,);
        }
    };
}

add_interface!(A);
add_interface!(A, B);
add_interface!(A, B, C);
add_interface!(A, B, C, D);

/// Builder for one bind request.
///
/// # Examples
///
/// ```rust
/// use bindgraph::{implements, Container, Injectable, TypeDescriptor};
///
/// trait Reader { fn read(&self) -> u8; }
/// trait Writer { fn write(&self, byte: u8); }
///
/// #[derive(Default)]
/// struct Buffer(std::cell::Cell<u8>);
/// impl Reader for Buffer { fn read(&self) -> u8 { self.0.get() } }
/// impl Writer for Buffer { fn write(&self, byte: u8) { self.0.set(byte) } }
/// impl Injectable for Buffer {
///     fn describe(d: &mut TypeDescriptor<Self>) { d.default_constructor(); }
/// }
/// implements!(Buffer => dyn Reader, dyn Writer);
///
/// let container = Container::new();
/// container
///     .bind::<dyn Reader>()
///     .and::<dyn Writer>()
///     .to_new_instance::<Buffer>()
///     .unwrap();
///
/// container.get::<dyn Writer>().unwrap().write(7);
/// assert_eq!(container.get::<dyn Reader>().unwrap().read(), 7);
/// ```
#[must_use = "a binder does nothing until a `to_*` method is called"]
pub struct Binder<'a, 'p, L> {
    container: &'a Container<'p>,
    qualifier: Option<Cow<'static, str>>,
    sharing: Sharing,
    _interfaces: PhantomData<fn() -> L>,
}

impl<'p> Container<'p> {
    /// Starts binding interface `I`.
    pub fn bind<I: ?Sized + 'static>(&self) -> Binder<'_, 'p, (Iface<I>,)> {
        Binder {
            container: self,
            qualifier: None,
            sharing: self.options.default_sharing,
            _interfaces: PhantomData,
        }
    }
}

impl<'a, 'p, L: InterfaceList> Binder<'a, 'p, L> {
    /// Also binds interface `I` to the same implementation.
    pub fn and<I: ?Sized + 'static>(self) -> Binder<'a, 'p, L::Output>
    where
        L: AddInterface<I>,
    {
        Binder {
            container: self.container,
            qualifier: self.qualifier,
            sharing: self.sharing,
            _interfaces: PhantomData,
        }
    }

    /// Qualifies every key of this binding.
    pub fn with_id(mut self, id: impl Into<Cow<'static, str>>) -> Self {
        self.qualifier = Some(id.into());
        self
    }

    /// Gives this binding its own instance instead of the shared one.
    pub fn as_unshared_instance(mut self) -> Self {
        self.sharing = Sharing::Unshared;
        self
    }

    // ----- Terminals -----

    /// Binds to an existing value.
    pub fn to_instance<Impl>(self, instance: Impl) -> DiResult<&'a Container<'p>>
    where
        Impl: Injectable,
        L: ImplementedBy<Impl>,
    {
        self.to_instance_rc(Rc::new(instance))
    }

    /// Binds to an existing shared value.
    pub fn to_instance_rc<Impl>(self, instance: Rc<Impl>) -> DiResult<&'a Container<'p>>
    where
        Impl: Injectable,
        L: ImplementedBy<Impl>,
    {
        let injector = self.container.injectors().get_or_create::<Impl>()?;
        let resolver = Resolver::instance(instance, injector.clone());
        self.install(&injector, resolver, Sharing::Unshared, None)
    }

    /// Binds to an instance constructed by the container through
    /// `Impl`'s constructors. Shared across bindings of `Impl` with the
    /// same qualifier unless [`as_unshared_instance`](Self::as_unshared_instance)
    /// was called.
    pub fn to_new_instance<Impl>(self) -> DiResult<&'a Container<'p>>
    where
        Impl: Injectable,
        L: ImplementedBy<Impl>,
    {
        let injector = self.container.injectors().get_or_create::<Impl>()?;
        let create = Resolver::new_instance(injector.clone());
        let resolver = match self.sharing {
            Sharing::Shared => Resolver::shared(
                DependencyKey::new(TypeKey::of::<Impl>(), self.qualifier.clone()),
                create,
            ),
            Sharing::Unshared => create,
        };
        let sharing = self.sharing;
        self.install(&injector, resolver, sharing, None)
    }

    /// Binds to values produced by `method`, called once per bound key.
    pub fn to_factory_method<Impl, F>(self, method: F) -> DiResult<&'a Container<'p>>
    where
        Impl: Injectable,
        F: Fn() -> Impl + 'static,
        L: ImplementedBy<Impl>,
    {
        let injector = self.container.injectors().get_or_create::<Impl>()?;
        let resolver = Resolver::function(injector.clone(), method);
        self.install(&injector, resolver, Sharing::Unshared, None)
    }

    /// Binds to values produced by a factory object.
    ///
    /// The factory is also bound as `dyn InstanceFactory<Impl>` with the
    /// same qualifier and is field-injected before each production.
    pub fn to_factory<Impl, F>(self, factory: F) -> DiResult<&'a Container<'p>>
    where
        Impl: Injectable,
        F: InstanceFactory<Impl>,
        L: ImplementedBy<Impl>,
    {
        let product = self.container.injectors().get_or_create::<Impl>()?;
        let factory_injector = self.container.injectors().get_or_create::<F>()?;
        let factory = Rc::new(factory);

        let companion = FactoryPlan {
            key: DependencyKey::new(
                TypeKey::of::<dyn InstanceFactory<Impl>>(),
                self.qualifier.clone(),
            ),
            implementation: DependencyKey::of::<F>(),
            depends_on: factory_injector.depends_on().clone(),
            resolver: Resolver::instance(factory.clone(), factory_injector.clone()),
            cast: factory_view::<F, Impl>,
        };
        let resolver = Resolver::external_factory(factory, factory_injector, product.clone());
        self.install(&product, resolver, Sharing::Unshared, Some(companion))
    }

    /// Binds to a user-supplied resolver producing `Impl` instances.
    pub fn to_custom_resolver<Impl, R>(self, resolver: R) -> DiResult<&'a Container<'p>>
    where
        Impl: Injectable,
        R: ResolveInstance,
        L: ImplementedBy<Impl>,
    {
        let injector = self.container.injectors().get_or_create::<Impl>()?;
        self.install(&injector, Resolver::custom(resolver), Sharing::Unshared, None)
    }

    fn install<Impl>(
        self,
        injector: &Injector<Impl>,
        resolver: Resolver,
        sharing: Sharing,
        factory: Option<FactoryPlan>,
    ) -> DiResult<&'a Container<'p>>
    where
        Impl: Injectable,
        L: ImplementedBy<Impl>,
    {
        let plan = BindingPlan {
            keys: L::keys(&self.qualifier),
            casts: L::casts(),
            implementation: DependencyKey::of::<Impl>(),
            depends_on: injector.depends_on().clone(),
            resolver,
            sharing,
            factory,
        };
        self.container.install_binding(plan)?;
        Ok(self.container)
    }
}
