//! Performance benchmarks for windowed aggregators

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use std::thread;
use stream_aggregator::{AggregationKind, Aggregators, WindowType};

/// Single-value fold per operation
fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");
    group.throughput(Throughput::Elements(1));

    for kind in AggregationKind::all() {
        let registry = Aggregators::new(4, WindowType::Rolling).unwrap();
        let aggregator = registry.create_simple::<f64>("bench", kind).unwrap();
        registry.start(0).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(kind), &kind, |b, _| {
            let mut value = 0.0;
            b.iter(|| {
                value += 1.0;
                aggregator.process(black_box(value));
            });
        });
    }

    group.finish();
}

/// Batched folds under a single lock acquisition
fn bench_process_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_batch");

    for size in [16_usize, 256, 4_096] {
        let registry = Aggregators::new(4, WindowType::Rolling).unwrap();
        let sum = registry.create_simple::<i64>("sum", AggregationKind::Sum).unwrap();
        registry.start(0).unwrap();
        let values: Vec<i64> = (0..size as i64).collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &values, |b, values| {
            b.iter(|| sum.process_batch(black_box(values)));
        });
    }

    group.finish();
}

/// Snapshot and merge between two registries
fn bench_snapshot_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_merge");

    let worker = Aggregators::new(2, WindowType::Rolling).unwrap();
    let source = worker.create_simple::<f64>("avg", AggregationKind::Average).unwrap();
    worker.start(0).unwrap();
    source.process_batch(&[1.0, 2.0, 3.0]);

    let leader = Aggregators::new(2, WindowType::Rolling).unwrap();
    let target = leader.create_simple::<f64>("avg", AggregationKind::Average).unwrap();
    leader.start(0).unwrap();

    group.bench_function("get_aggregatable", |b| {
        b.iter(|| black_box(source.get_aggregatable()));
    });

    let snapshot = source.get_aggregatable();
    group.bench_function("aggregate", |b| {
        b.iter(|| target.aggregate(black_box(&snapshot)).unwrap());
    });

    let json = snapshot.to_json().unwrap();
    group.bench_function("json_round_trip", |b| {
        b.iter(|| {
            let decoded =
                stream_aggregator::Aggregatable::<f64>::from_json(black_box(&json)).unwrap();
            target.aggregate(&decoded).unwrap();
        });
    });

    group.finish();
}

/// Window rotation across many registered aggregators
fn bench_roll(c: &mut Criterion) {
    let mut group = c.benchmark_group("roll");

    for count in [1_usize, 64, 1_024] {
        let registry = Aggregators::new(2, WindowType::Rolling).unwrap();
        let handles: Vec<_> = (0..count)
            .map(|i| {
                registry
                    .create_simple::<u64>(&format!("agg-{}", i), AggregationKind::Max)
                    .unwrap()
            })
            .collect();
        registry.start(0).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                for handle in &handles {
                    handle.process(1);
                }
                registry.roll().unwrap()
            });
        });
    }

    group.finish();
}

/// Contended updates from several threads into one aggregator
fn bench_contended(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_process");
    const PER_THREAD: u64 = 10_000;

    for threads in [2_u64, 4, 8] {
        let registry = Aggregators::new(2, WindowType::Rolling).unwrap();
        let count = registry.create_simple::<u64>("count", AggregationKind::Count).unwrap();
        registry.start(0).unwrap();

        group.throughput(Throughput::Elements(threads * PER_THREAD));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                thread::scope(|scope| {
                    for _ in 0..threads {
                        let count = Arc::clone(&count);
                        scope.spawn(move || {
                            for value in 0..PER_THREAD {
                                count.process(value);
                            }
                        });
                    }
                });
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_process,
    bench_process_batch,
    bench_snapshot_merge,
    bench_roll,
    bench_contended
);
criterion_main!(benches);
