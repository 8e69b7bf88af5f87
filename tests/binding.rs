use bindgraph::{
    implements, ConstructorShape, Container, DependencyKey, DiError, DiObserver, Inject, Injectable,
    Phase, TypeDescriptor,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

trait Storage {
    fn label(&self) -> &'static str;
}

trait Cache {
    fn backing(&self) -> Option<Rc<dyn Storage>>;
}

trait Service {
    fn summary(&self) -> String;
}

#[derive(Default)]
struct Disk;

impl Storage for Disk {
    fn label(&self) -> &'static str {
        "disk"
    }
}

impl Injectable for Disk {
    fn describe(d: &mut TypeDescriptor<Self>) {
        d.default_constructor();
    }
}

implements!(Disk => dyn Storage);

#[derive(Default)]
struct Lru {
    storage: Inject<dyn Storage>,
}

impl Cache for Lru {
    fn backing(&self) -> Option<Rc<dyn Storage>> {
        self.storage.get()
    }
}

impl Injectable for Lru {
    fn describe(d: &mut TypeDescriptor<Self>) {
        d.field(|c| &c.storage).default_constructor();
    }
}

implements!(Lru => dyn Cache);

struct Api {
    storage: Rc<dyn Storage>,
    cache: Inject<dyn Cache>,
}

impl Service for Api {
    fn summary(&self) -> String {
        let cached = self
            .cache
            .get()
            .and_then(|c| c.backing())
            .map(|s| s.label())
            .unwrap_or("none");
        format!("{} via {}", self.storage.label(), cached)
    }
}

impl Injectable for Api {
    fn describe(d: &mut TypeDescriptor<Self>) {
        d.field(|a| &a.cache).constructor(
            ConstructorShape::new().inject::<dyn Storage>(),
            |args| {
                Ok(Api {
                    storage: args.inject::<dyn Storage>()?,
                    cache: Inject::new(),
                })
            },
        );
    }
}

implements!(Api => dyn Service);

#[derive(Default)]
struct Recorder {
    resolved: RefCell<Vec<DependencyKey>>,
}

impl DiObserver for Recorder {
    fn resolving(&self, _key: &DependencyKey) {}

    fn resolved(&self, key: &DependencyKey, _duration: Duration) {
        self.resolved.borrow_mut().push(key.clone());
    }
}

#[test]
fn test_acyclic_graph_resolves_dependencies_first() {
    let recorder = Rc::new(Recorder::default());
    let container = Container::new();
    container.add_observer(recorder.clone());

    // Bound in reverse dependency order on purpose
    container.bind::<dyn Service>().to_new_instance::<Api>().unwrap();
    container.bind::<dyn Cache>().to_new_instance::<Lru>().unwrap();
    container.bind::<dyn Storage>().to_new_instance::<Disk>().unwrap();
    assert_eq!(container.phase(), Phase::Binding);

    let service = container.get::<dyn Service>().unwrap();
    assert_eq!(service.summary(), "disk via disk");
    assert_eq!(container.phase(), Phase::Resolved);

    let order = recorder.resolved.borrow();
    let position = |key: DependencyKey| order.iter().position(|k| *k == key).unwrap();
    assert!(position(DependencyKey::of::<dyn Storage>()) < position(DependencyKey::of::<dyn Cache>()));
    assert!(position(DependencyKey::of::<dyn Storage>()) < position(DependencyKey::of::<dyn Service>()));
    assert!(position(DependencyKey::of::<dyn Cache>()) < position(DependencyKey::of::<dyn Service>()));
    assert_eq!(order.len(), 3);
}

#[test]
fn test_repeated_get_returns_same_instance() {
    let container = Container::new();
    container.bind::<dyn Storage>().to_new_instance::<Disk>().unwrap();

    let first = container.get::<dyn Storage>().unwrap();
    let second = container.get::<dyn Storage>().unwrap();
    assert!(Rc::ptr_eq(&first, &second));
}

trait Ping {}
trait Pong {}
trait Echo {}

#[derive(Default)]
struct PingImpl {
    pong: Inject<dyn Pong>,
}

impl Ping for PingImpl {}

impl Injectable for PingImpl {
    fn describe(d: &mut TypeDescriptor<Self>) {
        d.field(|p| &p.pong).default_constructor();
    }
}

implements!(PingImpl => dyn Ping);

#[derive(Default)]
struct PongImpl {
    ping: Inject<dyn Ping>,
}

impl Pong for PongImpl {}
impl Echo for PongImpl {}

impl Injectable for PongImpl {
    fn describe(d: &mut TypeDescriptor<Self>) {
        d.field(|p| &p.ping).default_constructor();
    }
}

implements!(PongImpl => dyn Pong, dyn Echo);

#[derive(Default)]
struct StandalonePong;

impl Pong for StandalonePong {}

impl Injectable for StandalonePong {}

implements!(StandalonePong => dyn Pong);

#[test]
fn test_cyclic_bind_is_rejected_atomically() {
    let container = Container::new();
    container.bind::<dyn Ping>().to_new_instance::<PingImpl>().unwrap();

    let err = container
        .bind::<dyn Pong>()
        .and::<dyn Echo>()
        .to_new_instance::<PongImpl>()
        .unwrap_err();
    assert!(matches!(err, DiError::CyclicDependency { .. }));

    assert!(!container.is_bound::<dyn Pong>());
    assert!(!container.is_bound::<dyn Echo>());
    assert!(matches!(
        container.get::<dyn Pong>(),
        Err(DiError::DependencyNotFound(key)) if key == DependencyKey::of::<dyn Pong>()
    ));
    assert!(container.try_get::<dyn Echo>().unwrap().is_none());

    // The graph is unchanged, so a non-cyclic binding still goes through
    container
        .bind::<dyn Pong>()
        .to_instance(StandalonePong)
        .unwrap();
    let ping = container.get::<dyn Ping>();
    assert!(ping.is_ok());
}

#[test]
fn test_unsatisfied_dependency_fails_resolution() {
    let container = Container::new();
    container.bind::<dyn Ping>().to_new_instance::<PingImpl>().unwrap();

    let err = container.get::<dyn Ping>().err().unwrap();
    match err {
        DiError::MissingDependency { key, .. } => assert_eq!(key, DependencyKey::of::<dyn Pong>()),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(container.phase(), Phase::Binding);
}

#[test]
fn test_duplicate_binding_is_rejected() {
    let container = Container::new();
    container.bind_instance(1u32).unwrap();

    match container.bind_instance(2u32) {
        Err(DiError::DuplicateBinding(keys)) => assert_eq!(keys, vec![DependencyKey::of::<u32>()]),
        other => panic!("unexpected: {:?}", other.map(|_| ())),
    }
    assert_eq!(*container.get::<u32>().unwrap(), 1);
}

#[derive(Default)]
struct Both;

impl Storage for Both {
    fn label(&self) -> &'static str {
        "both"
    }
}

impl Cache for Both {
    fn backing(&self) -> Option<Rc<dyn Storage>> {
        None
    }
}

impl Injectable for Both {
    fn describe(d: &mut TypeDescriptor<Self>) {
        d.default_constructor();
    }
}

implements!(Both => dyn Storage, dyn Cache);

#[test]
fn test_partially_duplicate_request_binds_nothing() {
    let container = Container::new();
    container.bind::<dyn Storage>().to_new_instance::<Disk>().unwrap();

    let err = container
        .bind::<dyn Cache>()
        .and::<dyn Storage>()
        .to_new_instance::<Both>()
        .unwrap_err();
    match err {
        DiError::DuplicateBinding(keys) => assert_eq!(keys, vec![DependencyKey::of::<dyn Storage>()]),
        other => panic!("unexpected error: {}", other),
    }
    assert!(!container.is_bound::<dyn Cache>());
    assert_eq!(container.get::<dyn Storage>().unwrap().label(), "disk");
}

#[test]
fn test_unbind_then_rebind() {
    let container = Container::new();
    container.bind_instance(1u32).unwrap();
    assert_eq!(*container.get::<u32>().unwrap(), 1);

    assert!(container.unbind::<u32>().unwrap());
    assert!(!container.unbind::<u32>().unwrap());
    assert!(matches!(
        container.get::<u32>(),
        Err(DiError::DependencyNotFound(_))
    ));

    container.bind_instance(2u32).unwrap();
    assert_eq!(*container.get::<u32>().unwrap(), 2);
}

#[test]
fn test_multi_interface_binding_shares_one_object() {
    let container = Container::new();
    container
        .bind::<dyn Storage>()
        .and::<dyn Cache>()
        .to_new_instance::<Both>()
        .unwrap();

    let storage = container.get::<dyn Storage>().unwrap();
    let cache = container.get::<dyn Cache>().unwrap();
    assert_eq!(storage.label(), "both");
    assert_eq!(Rc::as_ptr(&storage) as *const (), Rc::as_ptr(&cache) as *const ());
    assert_eq!(container.shared_ref_count(&DependencyKey::of::<Both>()), 2);
}

#[test]
fn test_named_bindings_are_distinct_keys() {
    let container = Container::new();
    container
        .bind_named_instance(String::from("primary-db"), "primary")
        .unwrap();
    container
        .bind_named_instance(String::from("replica-db"), "replica")
        .unwrap();

    assert_eq!(container.get_named::<String>("primary").unwrap().as_str(), "primary-db");
    assert_eq!(container.get_named::<String>("replica").unwrap().as_str(), "replica-db");
    assert!(container.try_get::<String>().unwrap().is_none());
    assert!(container.unbind_named::<String>("replica").unwrap());
    assert!(container.try_get_named::<String>("replica").unwrap().is_none());
}

#[derive(Default)]
struct Repository {
    primary: Inject<String>,
}

impl Injectable for Repository {
    fn describe(d: &mut TypeDescriptor<Self>) {
        d.named_field("primary", |r| &r.primary).default_constructor();
    }
}

#[test]
fn test_named_field_injection() {
    let container = Container::new();
    container
        .bind_named_instance(String::from("primary-db"), "primary")
        .unwrap();
    container.bind_instance(String::from("default-db")).unwrap();

    let repository: Repository = container.create_injected_instance().unwrap();
    assert_eq!(repository.primary.get().unwrap().as_str(), "primary-db");
}

#[test]
fn test_binding_descriptors_reflect_state() {
    let container = Container::new();
    container.bind::<dyn Storage>().to_new_instance::<Disk>().unwrap();
    container.bind_instance(9u8).unwrap();

    let before = container.binding_descriptors();
    assert_eq!(before.len(), 2);
    assert!(before.iter().all(|d| !d.resolved));

    container.resolve_all().unwrap();
    let after = container.binding_descriptors();
    assert!(after.iter().all(|d| d.resolved));

    let storage = after
        .iter()
        .find(|d| d.key == DependencyKey::of::<dyn Storage>())
        .unwrap();
    assert!(storage.implementation_name().ends_with("Disk"));
}
