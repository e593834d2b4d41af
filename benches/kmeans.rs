use std::hint::black_box;

use compound_pred::kmeans::{PALETTE_MAX_SIZE, k_means};
use criterion::Criterion;
use criterion::{criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro128StarStar;

pub fn bench_k_means_1d(c: &mut Criterion) {
    c.bench_function("k_means 64x64 luma palette", |b| {
        let mut rng = Xoshiro128StarStar::from_seed(*b"deadbeeflolcakes");
        let data: Vec<i32> = (0..64 * 64).map(|_| rng.random_range(0..1024)).collect();
        let init: Vec<i32> = (0..PALETTE_MAX_SIZE)
            .map(|i| (i as i32 * 1024) / PALETTE_MAX_SIZE as i32)
            .collect();
        let mut centroids = vec![0i32; PALETTE_MAX_SIZE];
        let mut indices = vec![0u8; 64 * 64];

        b.iter(|| {
            centroids.copy_from_slice(&init);
            k_means::<1>(
                black_box(&data),
                black_box(&mut centroids),
                black_box(&mut indices),
                black_box(64 * 64),
                black_box(PALETTE_MAX_SIZE),
                black_box(50),
            );
        })
    });
}

pub fn bench_k_means_2d(c: &mut Criterion) {
    c.bench_function("k_means 32x32 chroma palette", |b| {
        let mut rng = Xoshiro128StarStar::from_seed(*b"deadbeeflolcakes");
        let data: Vec<i32> = (0..32 * 32 * 2).map(|_| rng.random_range(0..1024)).collect();
        let init: Vec<i32> = (0..PALETTE_MAX_SIZE * 2)
            .map(|i| (i as i32 * 1024) / (PALETTE_MAX_SIZE * 2) as i32)
            .collect();
        let mut centroids = vec![0i32; PALETTE_MAX_SIZE * 2];
        let mut indices = vec![0u8; 32 * 32];

        b.iter(|| {
            centroids.copy_from_slice(&init);
            k_means::<2>(
                black_box(&data),
                black_box(&mut centroids),
                black_box(&mut indices),
                black_box(32 * 32),
                black_box(PALETTE_MAX_SIZE),
                black_box(50),
            );
        })
    });
}

criterion_group!(bench_kmeans, bench_k_means_1d, bench_k_means_2d);
criterion_main!(bench_kmeans);
