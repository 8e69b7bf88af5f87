#![no_main]

use bindgraph::{DependencyGraph, DependencyKey};
use libfuzzer_sys::fuzz_target;

fn node(byte: u8) -> DependencyKey {
    DependencyKey::named::<u8>(format!("n{}", byte % 16))
}

fuzz_target!(|data: &[u8]| {
    let mut graph = DependencyGraph::new();

    for chunk in data.chunks_exact(3) {
        let (from, to) = (node(chunk[0]), node(chunk[1]));
        match chunk[2] % 4 {
            0 => {
                // Transactional add: the graph must stay acyclic
                let mut tx = graph.transaction();
                if tx.add_dependency(from, to, chunk[2] & 0x10 != 0).is_ok() {
                    tx.commit();
                }
            }
            1 => graph.remove_dependency(&from, &to),
            2 => graph.unmark_root(&from),
            _ => graph.add_dependency(from.clone(), from, false),
        }

        assert!(!graph.has_cycle());
        let order = graph.sorted().expect("acyclic graph sorts");
        assert_eq!(order.len(), graph.len());
        for key in order.iter() {
            let position = order.iter().position(|k| k == key).unwrap();
            for dependency in graph.dependencies_of(key) {
                let dependency_position = order.iter().position(|k| k == dependency).unwrap();
                assert!(dependency_position < position);
            }
        }
    }
});
