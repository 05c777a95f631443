//! # Beacon-Core Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | bc-compute | Order-preserving batch SHA-256 |
//! | bc-01 Committee | Deterministic shuffle, candidate assignment, swap |

use bc_01_committee::{assign_candidates, shuffle, swap_validator, PendingCounts, SwapLimits};
use bc_compute::batch_sha256;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use shared_types::Blacklist;
use std::time::Duration;

fn validators(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("validator-{:05}", i)).collect()
}

fn bench_batch_sha256(c: &mut Criterion) {
    let mut group = c.benchmark_group("bc-compute-hashing");
    group.measurement_time(Duration::from_secs(5));

    for size in [64, 512, 4096] {
        let inputs = validators(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("batch_sha256", size), &inputs, |b, inputs| {
            b.iter(|| black_box(batch_sha256(inputs)))
        });
    }
    group.finish();
}

fn bench_shuffle(c: &mut Criterion) {
    let mut group = c.benchmark_group("bc-01-shuffle");
    let seed: i64 = rand::thread_rng().gen();

    for size in [100, 1_000, 10_000] {
        let candidates = validators(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("shuffle", size), &candidates, |b, input| {
            b.iter(|| black_box(shuffle(input, seed)))
        });
    }
    group.finish();
}

fn bench_assignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("bc-01-assignment");
    let candidates = validators(2_000);

    for shards in [8, 64, 256] {
        group.bench_with_input(BenchmarkId::new("assign", shards), &shards, |b, shards| {
            b.iter(|| {
                let mut pending = PendingCounts::new();
                black_box(assign_candidates(&candidates, &mut pending, 7, 500, *shards))
            })
        });
    }
    group.finish();
}

fn bench_swap(c: &mut Criterion) {
    let mut group = c.benchmark_group("bc-01-swap");
    let limits = SwapLimits {
        max_committee_size: 256,
        min_committee_size: 64,
        offset: 8,
        swap_offset: 4,
    };
    let committee = validators(256);
    let pending: Vec<String> = (0..128).map(|i| format!("pending-{}", i)).collect();
    let blacklist: Blacklist = committee
        .iter()
        .step_by(16)
        .map(|v| (v.clone(), 2))
        .collect();

    group.bench_function("swap_validator_full_committee", |b| {
        b.iter(|| black_box(swap_validator(&pending, &committee, &limits, &blacklist)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_batch_sha256,
    bench_shuffle,
    bench_assignment,
    bench_swap
);
criterion_main!(benches);
