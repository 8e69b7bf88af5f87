use bindgraph::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

// ===== Fixtures =====

trait Clock {
    fn now(&self) -> u64;
}

#[derive(Default)]
struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        42
    }
}

impl Injectable for SystemClock {
    fn describe(d: &mut TypeDescriptor<Self>) {
        d.default_constructor();
    }
}

implements!(SystemClock => dyn Clock);

#[derive(Default)]
struct Scheduler {
    clock: Inject<dyn Clock>,
}

impl Injectable for Scheduler {
    fn describe(d: &mut TypeDescriptor<Self>) {
        d.field(|s| &s.clock).default_constructor();
    }
}

// ===== Micro Benchmarks =====

fn bench_resolved_hit(c: &mut Criterion) {
    let container = Container::new();
    container.bind::<dyn Clock>().to_new_instance::<SystemClock>().unwrap();
    container.resolve_all().unwrap();

    c.bench_function("resolved_hit_trait", |b| {
        b.iter(|| {
            let clock = container.get::<dyn Clock>().unwrap();
            black_box(clock.now());
        })
    });
}

fn bench_cold_resolve(c: &mut Criterion) {
    c.bench_function("cold_resolve_two_keys", |b| {
        b.iter(|| {
            let container = Container::new();
            container.bind::<dyn Clock>().to_new_instance::<SystemClock>().unwrap();
            container.bind::<Scheduler>().to_new_instance::<Scheduler>().unwrap();
            let scheduler = container.get::<Scheduler>().unwrap();
            black_box(scheduler.clock.is_injected());
        })
    });
}

fn bench_create_injected_instance(c: &mut Criterion) {
    let container = Container::new();
    container.bind::<dyn Clock>().to_new_instance::<SystemClock>().unwrap();
    container.resolve_all().unwrap();

    c.bench_function("create_injected_instance", |b| {
        b.iter(|| {
            let scheduler: Scheduler = container.create_injected_instance().unwrap();
            black_box(scheduler);
        })
    });
}

// ===== Scaling Benchmarks =====

fn bench_graph_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_sort_chain");
    for size in [16usize, 128, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut graph = DependencyGraph::new();
                for i in 1..size {
                    graph.add_dependency(
                        DependencyKey::named::<u8>(format!("n{}", i)),
                        DependencyKey::named::<u8>(format!("n{}", i - 1)),
                        i == size - 1,
                    );
                }
                black_box(graph.sorted().unwrap().len());
            })
        });
    }
    group.finish();
}

fn bench_named_bindings(c: &mut Criterion) {
    let mut group = c.benchmark_group("named_bindings_resolve_all");
    for count in [10usize, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let container = Container::new();
                for i in 0..count {
                    container.bind_named_instance(i, format!("slot{}", i)).unwrap();
                }
                container.resolve_all().unwrap();
                black_box(container.binding_descriptors().len());
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_resolved_hit,
    bench_cold_resolve,
    bench_create_injected_instance,
    bench_graph_sort,
    bench_named_bindings
);
criterion_main!(benches);
