//! Kernel benchmarks: each kernel across execution strategies and schedules.
//!
//! Run with: cargo bench --features parallel --bench kernels

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mapreduce_rs::kernels::{convolution, matmul, stencil, Strategy};
use mapreduce_rs::{DynGrid, Schedule};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::hint::black_box;
use std::time::Duration;

const VARIANTS: [(&str, Strategy, Schedule); 5] = [
    ("loop", Strategy::PureLoop, Schedule::Serial),
    ("map/serial", Strategy::Map, Schedule::Serial),
    (
        "map/parallel",
        Strategy::Map,
        Schedule::Parallel { threads: None },
    ),
    ("mapreduce/serial", Strategy::MapReduce, Schedule::Serial),
    (
        "mapreduce/parallel",
        Strategy::MapReduce,
        Schedule::Parallel { threads: None },
    ),
];

fn random_grid(rng: &mut StdRng, extents: [usize; 2]) -> DynGrid<f64, 2> {
    DynGrid::from_fn(extents, |_| rng.sample(StandardNormal))
}

/// Walk a buffer larger than the last-level cache so every timed iteration
/// starts from cold memory.
fn flush_cache() {
    const FLUSH_BYTES: usize = 64 << 20;
    let mut trash = vec![1u8; FLUSH_BYTES];
    for x in trash.iter_mut() {
        *x = x.wrapping_add(1);
    }
    black_box(&trash);
}

fn bench_matmul(c: &mut Criterion) {
    let mut group = c.benchmark_group("matmul");
    group.sample_size(10);
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(5));

    for size in [128, 256, 512] {
        group.throughput(Throughput::Elements((size * size * size) as u64));

        let mut rng = StdRng::seed_from_u64(42);
        let a = random_grid(&mut rng, [size, size]);
        let b = random_grid(&mut rng, [size, size]);

        for (name, strategy, schedule) in VARIANTS {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |bench, _| {
                bench.iter(|| {
                    flush_cache();
                    let mut out: DynGrid<f64, 2> = DynGrid::filled([size, size], 0.0);
                    matmul(&mut out, &a, &b, strategy, schedule).unwrap();
                    out
                })
            });
        }
    }
    group.finish();
}

fn bench_convolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("convolution");
    group.sample_size(10);
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(5));

    let order = 2;
    let w = 2 * order + 1;
    for size in [512, 1024, 2048] {
        group.throughput(Throughput::Elements((size * size * w * w) as u64));

        let mut rng = StdRng::seed_from_u64(42);
        let input = random_grid(&mut rng, [size, size]);
        let coeffs = random_grid(&mut rng, [w, w]);

        for (name, strategy, schedule) in VARIANTS {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |bench, _| {
                bench.iter(|| {
                    flush_cache();
                    let mut out: DynGrid<f64, 2> = DynGrid::filled([size, size], 0.0);
                    convolution(&mut out, &input, &coeffs, order, strategy, schedule).unwrap();
                    out
                })
            });
        }
    }
    group.finish();
}

fn bench_stencil(c: &mut Criterion) {
    let mut group = c.benchmark_group("stencil");
    group.sample_size(10);
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(5));

    let order = 4;
    for size in [512, 1024, 2048] {
        group.throughput(Throughput::Elements((size * size * 4 * order) as u64));

        let mut rng = StdRng::seed_from_u64(42);
        let input = random_grid(&mut rng, [size, size]);

        for (name, strategy, schedule) in VARIANTS {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |bench, _| {
                bench.iter(|| {
                    flush_cache();
                    let mut out: DynGrid<f64, 2> = DynGrid::filled([size, size], 0.0);
                    stencil(&mut out, &input, order, strategy, schedule).unwrap();
                    out
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_matmul, bench_convolution, bench_stencil);
criterion_main!(benches);
