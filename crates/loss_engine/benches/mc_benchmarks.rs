//! Criterion benchmarks for loss_engine sampling and reduction.
//!
//! Benchmarks cover:
//! - Per-trial stream derivation
//! - Frailty sampling (log-normal, inverse Gaussian)
//! - Copula uniform generation for growing portfolio sizes
//! - Parallel moment reduction with and without kept distribution

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use loss_engine::frailty::{
    ArchimedeanCopula, FrailtyGenerator, InverseGaussianFrailty, LogNormalFrailty,
};
use loss_engine::mc::{MonteCarloConfig, MonteCarloEngine};
use loss_engine::rng::LossRng;

fn engine(trials: usize) -> MonteCarloEngine {
    MonteCarloEngine::new(
        MonteCarloConfig::builder()
            .trials(trials)
            .seed(11)
            .build()
            .expect("valid config"),
    )
}

fn bench_stream_derivation(c: &mut Criterion) {
    c.bench_function("rng_for_trial", |b| {
        let mut trial = 0u64;
        b.iter(|| {
            trial = trial.wrapping_add(1);
            black_box(LossRng::for_trial(black_box(42), trial).gen_uniform())
        })
    });
}

fn bench_frailty_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("frailty_sampling");
    let log_normal = LogNormalFrailty::new(0.4).expect("valid sigma");
    let inverse_gaussian = InverseGaussianFrailty::new(1.0, 4.0).expect("valid params");

    group.bench_function("log_normal", |b| {
        let mut rng = LossRng::from_seed(1);
        b.iter(|| black_box(log_normal.sample(&mut rng)))
    });
    group.bench_function("inverse_gaussian", |b| {
        let mut rng = LossRng::from_seed(1);
        b.iter(|| black_box(inverse_gaussian.sample(&mut rng)))
    });
    group.finish();
}

fn bench_copula_uniforms(c: &mut Criterion) {
    let mut group = c.benchmark_group("copula_uniforms");
    let copula = ArchimedeanCopula::new(InverseGaussianFrailty::new(1.0, 4.0).expect("valid"));

    for loans in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("loans", loans), &loans, |b, &m| {
            let mut rng = LossRng::from_seed(5);
            b.iter(|| black_box(copula.uniforms(m, 1.2, &mut rng)))
        });
    }
    group.finish();
}

fn bench_moment_reduction(c: &mut Criterion) {
    let mut group = c.benchmark_group("moment_reduction");
    group.sample_size(30);

    for trials in [10_000usize, 100_000] {
        let e = engine(trials);
        group.bench_with_input(BenchmarkId::new("aggregate", trials), &e, |b, e| {
            b.iter(|| black_box(e.simulate(|t| e.rng_for_trial(t).gen_normal()).mean))
        });
        group.bench_with_input(BenchmarkId::new("distribution", trials), &e, |b, e| {
            b.iter(|| {
                black_box(
                    e.simulate_distribution(|t| e.rng_for_trial(t).gen_normal())
                        .variance,
                )
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_stream_derivation,
    bench_frailty_sampling,
    bench_copula_uniforms,
    bench_moment_reduction,
);
criterion_main!(benches);
