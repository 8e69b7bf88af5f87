//! The injection capability and interface casting.

use std::any::Any;
use std::rc::Rc;

use super::{Dispose, Initialize};
use crate::injector::TypeDescriptor;

/// A type the container can construct, inject into and manage.
///
/// `describe` lists the injectable fields and the constructors of the type.
/// The remaining methods expose optional lifecycle capabilities; all of
/// them have defaults, so a type with nothing to inject only needs
/// `impl Injectable for T {}`.
///
/// # Examples
///
/// ```rust
/// use bindgraph::{ConstructorShape, Inject, Injectable, TypeDescriptor};
///
/// trait Clock {
///     fn now(&self) -> u64;
/// }
///
/// struct Scheduler {
///     clock: Inject<dyn Clock>,
///     slots: usize,
/// }
///
/// impl Injectable for Scheduler {
///     fn describe(descriptor: &mut TypeDescriptor<Self>) {
///         descriptor
///             .field(|s| &s.clock)
///             .constructor(ConstructorShape::new().arg::<usize>(), |args| {
///                 Ok(Scheduler { clock: Inject::new(), slots: args.arg()? })
///             });
///     }
/// }
/// ```
pub trait Injectable: Any {
    /// Describe fields and constructors. The default describes nothing.
    fn describe(descriptor: &mut TypeDescriptor<Self>)
    where
        Self: Sized,
    {
        let _ = descriptor;
    }

    /// Disposal capability, usually `Some(self)`.
    fn as_dispose(&self) -> Option<&dyn Dispose> {
        None
    }

    /// Post-resolution hook, usually `Some(self)`.
    fn as_initialize(&self) -> Option<&dyn Initialize> {
        None
    }

    /// Whether the instance is still usable. Dead instances are treated as
    /// absent by lookups and are never injected into or disposed.
    fn is_alive(&self) -> bool {
        true
    }
}

/// Conversion of a shared implementation into a shared interface.
///
/// Every type upcasts to itself. Implementations of trait-object
/// interfaces are declared with [`implements!`](crate::implements).
pub trait Upcast<I: ?Sized + 'static>: 'static {
    fn upcast(this: Rc<Self>) -> Rc<I>;
}

impl<T: 'static> Upcast<T> for T {
    #[inline]
    fn upcast(this: Rc<Self>) -> Rc<T> {
        this
    }
}

/// Declares which trait-object interfaces an implementation can be bound to.
///
/// ```rust
/// use bindgraph::{implements, Injectable};
///
/// trait Reader {}
/// trait Writer {}
///
/// struct File;
/// impl Reader for File {}
/// impl Writer for File {}
/// impl Injectable for File {}
///
/// implements!(File => dyn Reader, dyn Writer);
/// ```
#[macro_export]
macro_rules! implements {
    ($implementation:ty => $($interface:ty),+ $(,)?) => {
        $(
            impl $crate::Upcast<$interface> for $implementation {
                #[inline]
                fn upcast(this: ::std::rc::Rc<Self>) -> ::std::rc::Rc<$interface> {
                    this
                }
            }
        )+
    };
}

macro_rules! plain_injectable {
    ($($ty:ty),* $(,)?) => {
        $(impl Injectable for $ty {})*
    };
}

plain_injectable!(
    (),
    bool,
    char,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    f32,
    f64,
    String,
    &'static str,
);
