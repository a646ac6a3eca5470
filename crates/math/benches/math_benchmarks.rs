//! Benchmarks for pcarisk-math operations.
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use ndarray::Array2;
use pcarisk_math::{correlation_matrix, covariance_matrix, symmetric_eigen};
use rand::Rng;

fn random_returns(rows: usize, cols: usize) -> Array2<f64> {
    let mut rng = rand::thread_rng();
    Array2::from_shape_fn((rows, cols), |_| rng.r#gen::<f64>() * 0.04 - 0.02)
}

fn bench_covariance(c: &mut Criterion) {
    let mut group = c.benchmark_group("covariance_matrix");

    for assets in [10, 50, 160] {
        group.throughput(Throughput::Elements((assets * 250) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(assets), &assets, |b, &assets| {
            let data = random_returns(250, assets);
            b.iter(|| covariance_matrix(black_box(&data)).unwrap());
        });
    }

    group.finish();
}

fn bench_symmetric_eigen(c: &mut Criterion) {
    let mut group = c.benchmark_group("symmetric_eigen");

    for assets in [10, 50, 160] {
        group.bench_with_input(BenchmarkId::from_parameter(assets), &assets, |b, &assets| {
            let corr = correlation_matrix(&random_returns(500, assets)).unwrap();
            b.iter(|| symmetric_eigen(black_box(&corr)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_covariance, bench_symmetric_eigen);
criterion_main!(benches);
