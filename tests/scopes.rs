use bindgraph::{implements, ConstructorShape, Container, Injectable, TypeDescriptor};
use std::rc::Rc;

#[test]
fn test_child_falls_back_to_parent() {
    let parent = Container::with_name("app");
    parent.bind_instance(5u32).unwrap();

    let child = parent.create_child_container(Some("request")).unwrap();
    assert_eq!(child.name(), Some("request"));
    assert!(child.is_bound::<u32>());
    assert_eq!(*child.get::<u32>().unwrap(), 5);

    let from_parent = parent.get::<u32>().unwrap();
    let from_child = child.get::<u32>().unwrap();
    assert!(Rc::ptr_eq(&from_parent, &from_child));
}

#[test]
fn test_nearest_binding_wins() {
    let parent = Container::new();
    parent.bind_instance(5u32).unwrap();

    let child = parent.create_child_container(None).unwrap();
    child.bind_instance(7u32).unwrap();

    assert_eq!(*child.get::<u32>().unwrap(), 7);
    assert_eq!(*parent.get::<u32>().unwrap(), 5);
}

#[test]
fn test_parent_does_not_see_child_bindings() {
    let parent = Container::new();
    let child = parent.create_child_container(None).unwrap();
    child.bind_instance(String::from("scoped")).unwrap();

    assert!(parent.try_get::<String>().unwrap().is_none());
    assert_eq!(child.get::<String>().unwrap().as_str(), "scoped");
}

trait Clock {
    fn now(&self) -> u64;
}

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

impl Injectable for FixedClock {}

implements!(FixedClock => dyn Clock);

struct Request {
    started: u64,
}

impl Injectable for Request {
    fn describe(d: &mut TypeDescriptor<Self>) {
        d.constructor(ConstructorShape::new().inject::<dyn Clock>(), |args| {
            let clock = args.inject::<dyn Clock>()?;
            Ok(Request {
                started: clock.now(),
            })
        });
    }
}

#[test]
fn test_child_binding_depends_on_parent_binding() {
    let parent = Container::new();
    parent
        .bind::<dyn Clock>()
        .to_instance(FixedClock(1_700_000_000))
        .unwrap();

    let child = parent.create_child_container(Some("request")).unwrap();
    child.bind::<Request>().to_new_instance::<Request>().unwrap();

    assert_eq!(child.get::<Request>().unwrap().started, 1_700_000_000);
}

#[test]
fn test_grandchild_chain() {
    let root = Container::new();
    root.bind_instance(1u8).unwrap();
    let middle = root.create_child_container(Some("middle")).unwrap();
    middle.bind_instance(2u16).unwrap();
    let leaf = middle.create_child_container(Some("leaf")).unwrap();

    assert_eq!(*leaf.get::<u8>().unwrap(), 1);
    assert_eq!(*leaf.get::<u16>().unwrap(), 2);
    assert!(leaf.try_get::<u32>().unwrap().is_none());
    assert!(leaf.parent().is_some());
}

#[test]
fn test_child_shares_injector_registry() {
    let parent = Container::new();
    parent.bind::<Request>().to_new_instance::<Request>().unwrap();
    let child = parent.create_child_container(None).unwrap();

    assert!(child.injectors().contains::<Request>());
}
