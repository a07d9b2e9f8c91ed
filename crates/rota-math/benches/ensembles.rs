//! Criterion benchmarks for `rota-math`.
//!
//! Batch sizes mirror a department's monthly schedule (tens to a few
//! hundred residents) and a year of call history.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rota_math::{ForestConfig, IsolationForest, IsolationForestConfig, RandomForestRegressor};

fn synthetic_rows(n: usize, width: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| {
            (0..width)
                .map(|j| ((i * 31 + j * 17) % 23) as f64 / 7.0)
                .collect()
        })
        .collect()
}

fn bench_isolation(c: &mut Criterion) {
    let mut group = c.benchmark_group("isolation_forest");
    for n in [32usize, 128, 512] {
        let rows = synthetic_rows(n, 8);
        group.bench_with_input(BenchmarkId::new("fit_score", n), &rows, |b, rows| {
            b.iter(|| {
                black_box(
                    IsolationForest::fit_score(black_box(rows), &IsolationForestConfig::default())
                        .ok(),
                )
            });
        });
    }
    group.finish();
}

fn bench_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("random_forest");
    group.sample_size(10);
    for n in [100usize, 400] {
        let x = synthetic_rows(n, 10);
        let y: Vec<f64> = (0..n).map(|i| (i % 2) as f64).collect();
        let config = ForestConfig {
            n_estimators: 20,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("fit", n), &(x, y), |b, (x, y)| {
            b.iter(|| {
                black_box(RandomForestRegressor::fit(black_box(x), black_box(y), &config).ok())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_isolation, bench_forest);
criterion_main!(benches);
