//! Coordinator dispatch overhead.
//!
//! Measures the cost of `update_all` over a sequence of trivial modules, so
//! the per-module bookkeeping (timing, tracing, state checks) is what gets
//! measured rather than module work.
//!
//! Run with: `cargo bench --bench coordinator_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cadence_core::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn counting_coordinator(module_count: usize) -> Coordinator<u64> {
    let mut builder = CoordinatorBuilder::<u64>::new();
    for idx in 0..module_count {
        builder = builder.with_instance(
            &format!("module_{idx}"),
            from_fn(|_: &TickContext, counter: &mut u64| {
                *counter = counter.wrapping_add(1);
                Ok(())
            }),
        );
    }
    builder
        .build(&Dependencies::new())
        .expect("benchmark coordinator should build")
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_update_all_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_all");
    for module_count in [1usize, 8, 64, 512] {
        group.bench_with_input(
            BenchmarkId::from_parameter(module_count),
            &module_count,
            |b, &module_count| {
                let mut coordinator = counting_coordinator(module_count);
                let mut counter = 0u64;
                coordinator
                    .initialize_all(&mut counter)
                    .expect("benchmark coordinator should initialize");
                let mut tick = 0u64;
                b.iter(|| {
                    let ctx = TickContext::new(tick, 1.0 / 60.0);
                    coordinator
                        .update_all(&ctx, &mut counter)
                        .expect("benchmark update should succeed");
                    tick += 1;
                    black_box(counter);
                });
            },
        );
    }
    group.finish();
}

fn bench_build_and_initialize(c: &mut Criterion) {
    c.bench_function("build_and_initialize_64_modules", |b| {
        b.iter(|| {
            let mut coordinator = counting_coordinator(64);
            let mut counter = 0u64;
            coordinator
                .initialize_all(&mut counter)
                .expect("benchmark coordinator should initialize");
            black_box(coordinator.module_count());
        });
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(benches, bench_update_all_scaling, bench_build_and_initialize);
criterion_main!(benches);
