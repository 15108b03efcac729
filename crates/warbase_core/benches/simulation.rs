//! Simulation benchmarks for warbase_core.
//!
//! Run with: `cargo bench -p warbase_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use warbase_core::config::EngineConfig;
use warbase_core::interfaces::InputState;
use warbase_core::render::Renderer;
use warbase_core::simulation::Simulation;
use warbase_core::snapshot::{decode, encode};

/// A game some way in, with robots on the field.
fn midgame() -> Simulation {
    let mut sim = Simulation::new(EngineConfig::default().with_seed(42));
    for _ in 0..2000 {
        sim.step(&InputState::IDLE);
    }
    sim
}

/// Runs simulation benchmarks for the warbase_core crate.
pub fn simulation_benchmark(c: &mut Criterion) {
    let base = midgame();

    c.bench_function("step", |b| {
        b.iter_batched(
            || base.clone(),
            |mut sim| black_box(sim.step(&InputState::IDLE)),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("step_and_render", |b| {
        let mut renderer = Renderer::new();
        b.iter_batched(
            || base.clone(),
            |mut sim| {
                sim.step(&InputState::IDLE);
                black_box(renderer.render(&sim).ink_count())
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("snapshot_round_trip", |b| {
        b.iter(|| {
            let bytes = encode(black_box(&base)).unwrap_or_default();
            black_box(decode(&bytes).is_ok())
        });
    });
}

criterion_group!(benches, simulation_benchmark);
criterion_main!(benches);
