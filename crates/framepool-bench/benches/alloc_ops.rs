//! Criterion micro-benchmarks for allocation, release and port access.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use framepool_arena::FramePool;
use framepool_bench::{churn_sizes, reference_pool};
use framepool_core::{AllocInputs, SizeRequest, Width};
use framepool_engine::AllocatorUnit;
use framepool_test_utils::ramp_payload;

/// Benchmark: FIFO allocate/release churn on the 1024-slot pool.
fn bench_alloc_release_churn(c: &mut Criterion) {
    let mut pool = FramePool::new(reference_pool(Width::Bits32)).unwrap();
    let sizes = churn_sizes(256);
    let mut live = std::collections::VecDeque::with_capacity(16);

    c.bench_function("alloc_release_churn_256", |b| {
        b.iter(|| {
            for &size in &sizes {
                if live.len() == 16 {
                    let oldest = live.pop_front().unwrap();
                    pool.release(&oldest).unwrap();
                }
                live.push_back(pool.allocate(size).unwrap());
            }
            black_box(pool.allocator().free_units());
        });
    });
}

/// Benchmark: oversize requests, which must not touch free-space state.
fn bench_reject_oversize(c: &mut Criterion) {
    let mut pool = FramePool::new(reference_pool(Width::Bits32)).unwrap();
    let oversize = SizeRequest::new(31).unwrap();
    c.bench_function("reject_oversize", |b| {
        b.iter(|| black_box(pool.allocate(black_box(oversize)).is_err()));
    });
}

/// Benchmark: strobe-to-pulse through the cycle-level allocator unit.
fn bench_unit_strobe_to_pulse(c: &mut Criterion) {
    let pool = FramePool::new(reference_pool(Width::Bits32)).unwrap();
    let (producer, _consumer) = pool.split();
    let (allocator, _) = producer.into_parts();
    let mut unit = AllocatorUnit::new(allocator, 2);
    let size = SizeRequest::new(16).unwrap();

    c.bench_function("unit_strobe_to_pulse", |b| {
        b.iter(|| {
            unit.clock(AllocInputs::strobe(size));
            unit.clock(AllocInputs::idle());
            let out = unit.clock(AllocInputs::idle());
            if let Some(Ok(a)) = unit.take_response() {
                unit.release(&a).unwrap();
            }
            black_box(out)
        });
    });
}

/// Benchmark: write 16 units then read them back at 32 bits.
fn bench_round_trip_16(c: &mut Criterion) {
    let mut pool = FramePool::new(reference_pool(Width::Bits32)).unwrap();
    let payload = ramp_payload(16);
    let size = SizeRequest::new(16).unwrap();

    c.bench_function("round_trip_16_x4", |b| {
        b.iter(|| {
            let a = pool.allocate(size).unwrap();
            pool.writer().block(a).extend(payload.iter().copied()).unwrap();
            let units = pool.reader().drain_units(&a).unwrap();
            pool.release(&a).unwrap();
            black_box(units)
        });
    });
}

criterion_group!(
    benches,
    bench_alloc_release_churn,
    bench_reject_oversize,
    bench_unit_strobe_to_pulse,
    bench_round_trip_16
);
criterion_main!(benches);
