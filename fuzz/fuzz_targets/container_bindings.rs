#![no_main]

use bindgraph::{Container, DependencyKey, DiError};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let container = Container::new();
    let mut model = [false; 8];

    for pair in data.chunks_exact(2) {
        let slot = (pair[0] % 8) as usize;
        let name = format!("slot{}", slot);
        match pair[1] % 3 {
            0 => match container.bind_named_instance(pair[1] as u32, name) {
                Ok(_) => {
                    assert!(!model[slot]);
                    model[slot] = true;
                }
                Err(DiError::DuplicateBinding(_)) => assert!(model[slot]),
                Err(other) => panic!("unexpected error: {}", other),
            },
            1 => {
                let removed = container.unbind_named::<u32>(name).unwrap();
                assert_eq!(removed, model[slot]);
                model[slot] = false;
            }
            _ => {
                let found = container.try_get_named::<u32>(name).unwrap();
                assert_eq!(found.is_some(), model[slot]);
            }
        }
    }

    let bound = container.binding_descriptors().len();
    assert_eq!(bound, model.iter().filter(|b| **b).count());
    assert_eq!(
        container.is_bound_key(&DependencyKey::named::<u32>("slot0")),
        model[0]
    );
});
