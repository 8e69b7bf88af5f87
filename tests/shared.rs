use bindgraph::{
    implements, Container, ContainerOptions, DependencyKey, Injectable, RefCounter, Sharing,
    TypeDescriptor,
};
use proptest::prelude::*;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

thread_local! {
    static CREATED: Cell<usize> = Cell::new(0);
}

trait Reader {
    fn serial(&self) -> usize;
}

trait Writer {}

struct Journal {
    serial: usize,
}

impl Default for Journal {
    fn default() -> Self {
        let serial = CREATED.with(|c| {
            c.set(c.get() + 1);
            c.get()
        });
        Journal { serial }
    }
}

impl Reader for Journal {
    fn serial(&self) -> usize {
        self.serial
    }
}
impl Writer for Journal {}

impl Injectable for Journal {
    fn describe(d: &mut TypeDescriptor<Self>) {
        d.default_constructor();
    }
}

implements!(Journal => dyn Reader, dyn Writer);

fn address<T: ?Sized>(value: &Rc<T>) -> *const () {
    Rc::as_ptr(value) as *const ()
}

#[test]
fn test_shared_instance_is_reference_counted_per_key() {
    let container = Container::new();
    let shared = DependencyKey::of::<Journal>();

    container.bind::<dyn Reader>().to_new_instance::<Journal>().unwrap();
    container.bind::<dyn Writer>().to_new_instance::<Journal>().unwrap();
    container.bind::<Journal>().to_new_instance::<Journal>().unwrap();
    container.resolve_all().unwrap();
    assert_eq!(container.shared_ref_count(&shared), 3);

    let reader = container.get::<dyn Reader>().unwrap();
    let writer = container.get::<dyn Writer>().unwrap();
    let journal = container.get::<Journal>().unwrap();
    assert_eq!(address(&reader), address(&writer));
    assert_eq!(address(&reader), address(&journal));

    container.unbind::<dyn Reader>().unwrap();
    assert_eq!(container.shared_ref_count(&shared), 2);
    container.unbind::<dyn Writer>().unwrap();
    assert_eq!(container.shared_ref_count(&shared), 1);
    container.unbind::<Journal>().unwrap();
    assert_eq!(container.shared_ref_count(&shared), 0);

    // Last reference gone: a new binding gets a new instance
    container.bind::<dyn Reader>().to_new_instance::<Journal>().unwrap();
    let fresh = container.get::<dyn Reader>().unwrap();
    assert_ne!(address(&fresh), address(&journal));
    assert_eq!(container.shared_ref_count(&shared), 1);
}

#[test]
fn test_unshared_bindings_construct_their_own_instance() {
    let container = Container::new();
    container
        .bind::<dyn Reader>()
        .as_unshared_instance()
        .to_new_instance::<Journal>()
        .unwrap();
    container
        .bind::<dyn Writer>()
        .as_unshared_instance()
        .to_new_instance::<Journal>()
        .unwrap();

    let reader = container.get::<dyn Reader>().unwrap();
    let writer = container.get::<dyn Writer>().unwrap();
    assert_ne!(address(&reader), address(&writer));
    assert_eq!(container.shared_ref_count(&DependencyKey::of::<Journal>()), 0);

    let descriptors = container.binding_descriptors();
    assert!(descriptors.iter().all(|d| d.sharing == Sharing::Unshared));
}

#[test]
fn test_unshared_multi_key_binding_keeps_one_instance() {
    let container = Container::new();
    container
        .bind::<dyn Reader>()
        .and::<dyn Writer>()
        .as_unshared_instance()
        .to_new_instance::<Journal>()
        .unwrap();

    let reader = container.get::<dyn Reader>().unwrap();
    let writer = container.get::<dyn Writer>().unwrap();
    assert_eq!(address(&reader), address(&writer));
}

#[test]
fn test_qualifier_separates_shared_instances() {
    let container = Container::new();
    container.bind::<dyn Reader>().to_new_instance::<Journal>().unwrap();
    container
        .bind::<dyn Writer>()
        .with_id("audit")
        .to_new_instance::<Journal>()
        .unwrap();

    let reader = container.get::<dyn Reader>().unwrap();
    let audit = container.get_named::<dyn Writer>("audit").unwrap();
    assert_ne!(address(&reader), address(&audit));
    assert_eq!(container.shared_ref_count(&DependencyKey::of::<Journal>()), 1);
    assert_eq!(container.shared_ref_count(&DependencyKey::named::<Journal>("audit")), 1);
}

#[test]
fn test_default_sharing_comes_from_options() {
    let options = ContainerOptions {
        default_sharing: Sharing::Unshared,
        ..ContainerOptions::default()
    };
    let container = Container::with_options(options);
    container.bind::<dyn Reader>().to_new_instance::<Journal>().unwrap();
    container.bind::<dyn Writer>().to_new_instance::<Journal>().unwrap();

    let reader = container.get::<dyn Reader>().unwrap();
    let writer = container.get::<dyn Writer>().unwrap();
    assert_ne!(address(&reader), address(&writer));
}

#[test]
fn test_shared_instance_constructed_once() {
    let container = Container::new();
    let before = CREATED.with(Cell::get);
    container.bind::<dyn Reader>().to_new_instance::<Journal>().unwrap();
    container.bind::<dyn Writer>().to_new_instance::<Journal>().unwrap();
    container.resolve_all().unwrap();
    assert_eq!(CREATED.with(Cell::get) - before, 1);

    let reader = container.get::<dyn Reader>().unwrap();
    assert_eq!(reader.serial(), before + 1);
}

proptest! {
    #[test]
    fn ref_counter_matches_saturating_model(ops in prop::collection::vec((0u8..4, any::<bool>()), 0..64)) {
        let mut counter = RefCounter::new();
        let mut model: HashMap<u8, usize> = HashMap::new();

        for (key, acquire) in ops {
            let expected = model.entry(key).or_insert(0);
            let actual = if acquire {
                *expected += 1;
                counter.increment(key)
            } else {
                *expected = expected.saturating_sub(1);
                counter.decrement(&key)
            };
            prop_assert_eq!(actual, *expected);
        }

        for key in 0u8..4 {
            prop_assert_eq!(counter.count(&key), model.get(&key).copied().unwrap_or(0));
        }
    }
}
