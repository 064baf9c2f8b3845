//! Criterion benchmarks for Pfxsrc critical paths
//!
//! Benchmarks the core performance-critical operations:
//! - Record: parsing project text into a table tree
//! - Schema: full project reads (parse, migrate, read) and writes
//! - Steps: keyframe sampling and per-particle affector application
//! - Emission: initializer sampling

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pfxsrc::affector::{Affectors, Particle};
use pfxsrc::emission::{emit, Rng};
use pfxsrc::initializer::ParticleInitializer;
use pfxsrc::math::{Colorf, Vector2f, Vector2i};
use pfxsrc::record;
use pfxsrc::schema::{read_project, write_project, State, SystemState};
use pfxsrc::steps::{Step, StepSequence};

// =============================================================================
// Test Data Generators
// =============================================================================

/// `n` evenly spaced steps over the particle lifetime
fn make_steps<T>(n: usize, value: impl Fn(usize) -> T) -> Vec<Step<T>> {
    (0..n).map(|i| Step::new(i as f32 / (n.max(2) - 1) as f32, value(i))).collect()
}

/// A project with `systems` systems, each with `steps` steps per channel
fn make_state(systems: usize, steps: usize) -> State {
    let mut state = State::default();
    for i in 0..systems {
        state.systems.push(SystemState {
            name: format!("system_{}", i),
            texture_name: "spark.png".to_string(),
            color_steps: make_steps(steps, |j| Colorf::new(1.0, j as f32 * 0.1, 0.0, 1.0)),
            size_steps: make_steps(steps, |j| Vector2f::splat(1.0 + j as f32)),
            rotation_steps: make_steps(steps, |j| j as f32 * 30.0),
            position_steps: make_steps(steps, |j| Vector2f::new(j as f32, -(j as f32))),
            velocity_steps: make_steps(steps, |_| Vector2f::new(0.0, 9.8)),
            ..SystemState::default()
        });
    }
    state
}

fn make_affectors(steps: usize) -> Affectors {
    let mut affectors = Affectors::default();
    affectors.color.steps =
        StepSequence::from_steps(make_steps(steps, |j| Colorf::new(1.0, j as f32 * 0.1, 0.0, 1.0)));
    affectors.size.steps = StepSequence::from_steps(make_steps(steps, |j| Vector2f::splat(j as f32)));
    affectors.rotation.steps = StepSequence::from_steps(make_steps(steps, |j| j as f32 * 10.0));
    affectors
}

// =============================================================================
// Record and Schema Benchmarks
// =============================================================================

fn bench_schema(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema");

    for (systems, steps) in [(1, 4), (8, 8), (32, 16)].iter() {
        let text = write_project(&make_state(*systems, *steps));
        let name = format!("{}x{}", systems, steps);

        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", &name), &text, |b, text| {
            b.iter(|| record::parse(black_box(text)))
        });
        group.bench_with_input(BenchmarkId::new("read_project", &name), &text, |b, text| {
            b.iter(|| read_project(black_box(text)))
        });

        let state = make_state(*systems, *steps);
        group.bench_with_input(BenchmarkId::new("write_project", &name), &state, |b, state| {
            b.iter(|| write_project(black_box(state)))
        });
    }

    group.finish();
}

// =============================================================================
// Step Sampling Benchmarks
// =============================================================================

fn bench_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("steps");

    for n in [2usize, 8, 32].iter() {
        let sequence = StepSequence::from_steps(make_steps(*n, |j| j as f32));
        group.bench_with_input(BenchmarkId::new("sample", n), &sequence, |b, sequence| {
            b.iter(|| {
                let mut sum = 0.0;
                for i in 0..100 {
                    sum += sequence.sample_or(black_box(i as f32 / 100.0), 0.0);
                }
                sum
            })
        });
    }

    let affectors = make_affectors(8);
    group.bench_function("apply_1000_particles", |b| {
        b.iter(|| {
            let mut particle = Particle::default();
            for i in 0..1000 {
                affectors.apply(&mut particle, black_box(i as f32 / 1000.0));
            }
            particle
        })
    });

    group.finish();
}

// =============================================================================
// Emission Benchmarks
// =============================================================================

fn bench_emission(c: &mut Criterion) {
    let mut group = c.benchmark_group("emission");

    let init = ParticleInitializer { amount: Vector2i::new(16, 64), ..ParticleInitializer::default() };
    group.bench_function("emit_16_to_64", |b| {
        let mut rng = Rng::new(42);
        b.iter(|| emit(black_box(&init), &mut rng))
    });

    group.finish();
}

criterion_group!(benches, bench_schema, bench_steps, bench_emission);

criterion_main!(benches);
