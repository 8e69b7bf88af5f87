//! # bindgraph
//!
//! Graph-ordered dependency injection for single-threaded Rust programs.
//!
//! ## Features
//!
//! - **Interface bindings**: bind one or more trait objects (or concrete
//!   types) to an implementation, optionally qualified by a name
//! - **Dependency graph**: every bind is checked for cycles up front and a
//!   rejected bind leaves the container untouched
//! - **Ordered resolution**: bound keys resolve lazily in dependency order,
//!   each instance injected before anything depending on it
//! - **Shared instances**: reference-counted sharing of one implementation
//!   across bindings, released when the last binding goes
//! - **Container trees**: child containers fall back to their ancestors
//! - **Lifecycle hooks**: initialize after resolution, dispose in reverse
//!   resolution order
//!
//! ## Quick Start
//!
//! ```rust
//! use bindgraph::{implements, ConstructorShape, Container, Inject, Injectable, TypeDescriptor};
//!
//! trait Audience {
//!     fn name(&self) -> String;
//! }
//!
//! trait Greeter {
//!     fn greet(&self) -> String;
//! }
//!
//! struct World;
//! impl Audience for World {
//!     fn name(&self) -> String {
//!         "world".to_string()
//!     }
//! }
//! impl Injectable for World {}
//! implements!(World => dyn Audience);
//!
//! struct Polite {
//!     audience: Inject<dyn Audience>,
//! }
//! impl Greeter for Polite {
//!     fn greet(&self) -> String {
//!         let audience = self.audience.get().map(|a| a.name()).unwrap_or_default();
//!         format!("hello, {}", audience)
//!     }
//! }
//! impl Injectable for Polite {
//!     fn describe(d: &mut TypeDescriptor<Self>) {
//!         d.field(|p| &p.audience)
//!             .constructor(ConstructorShape::new(), |_| Ok(Polite { audience: Inject::new() }));
//!     }
//! }
//! implements!(Polite => dyn Greeter);
//!
//! let container = Container::new();
//! container.bind::<dyn Greeter>().to_new_instance::<Polite>().unwrap();
//! container.bind::<dyn Audience>().to_instance(World).unwrap();
//!
//! let greeter = container.get::<dyn Greeter>().unwrap();
//! assert_eq!(greeter.greet(), "hello, world");
//! ```
//!
//! ## Cycles
//!
//! ```rust
//! use bindgraph::{implements, Container, DiError, Inject, Injectable, TypeDescriptor};
//!
//! trait Ping {}
//! trait Pong {}
//!
//! #[derive(Default)]
//! struct A { pong: Inject<dyn Pong> }
//! impl Ping for A {}
//! impl Injectable for A {
//!     fn describe(d: &mut TypeDescriptor<Self>) {
//!         d.field(|a| &a.pong).default_constructor();
//!     }
//! }
//! implements!(A => dyn Ping);
//!
//! #[derive(Default)]
//! struct B { ping: Inject<dyn Ping> }
//! impl Pong for B {}
//! impl Injectable for B {
//!     fn describe(d: &mut TypeDescriptor<Self>) {
//!         d.field(|b| &b.ping).default_constructor();
//!     }
//! }
//! implements!(B => dyn Pong);
//!
//! let container = Container::new();
//! container.bind::<dyn Ping>().to_new_instance::<A>().unwrap();
//! let err = container.bind::<dyn Pong>().to_new_instance::<B>().unwrap_err();
//! assert!(matches!(err, DiError::CyclicDependency { .. }));
//! assert!(!container.is_bound::<dyn Pong>());
//! ```

pub mod config;
pub mod container;
pub mod descriptors;
pub mod error;
pub mod graph;
pub mod injector;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod resolver;
pub mod traits;

// Internal modules
mod internal;

// Re-export core types
pub use config::{ContainerOptions, DEFAULT_ENV_PREFIX};
pub use container::{AddInterface, Binder, Container, Iface, ImplementedBy, InterfaceList};
pub use descriptors::BindingDescriptor;
pub use error::{DiError, DiResult};
pub use graph::{CycleEdge, DependencyGraph, GraphTransaction};
pub use injector::{
    Arg, Args, ConstructorArgs, ConstructorPolicy, ConstructorShape, Inject, InjectableConstructor,
    InjectableField, Injector, InjectorRegistry, TypeDescriptor,
};
pub use key::{key_of, DependencyKey, TypeKey};
pub use lifetime::{Phase, Sharing};
pub use observer::{DiObserver, LoggingObserver};
pub use resolver::{Instance, InstanceFactory, RefCounter, ResolveInstance, ResolverKind, SharedInstanceCache};
pub use traits::{Dispose, Initialize, Injectable, Upcast};
