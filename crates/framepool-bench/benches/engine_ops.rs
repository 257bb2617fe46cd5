//! Criterion benchmarks for the dual-clock engine.

use std::hint::black_box;
use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use framepool_bench::reference_engine;
use framepool_core::Width;
use framepool_engine::{Frame, FrameEngine};
use framepool_test_utils::seeded_payload;

/// Benchmark: one 16-unit frame through both clock domains and back.
fn bench_engine_frame_latency(c: &mut Criterion) {
    let engine = FrameEngine::start(reference_engine(Width::Bits32)).unwrap();
    let payload = seeded_payload(42, 16, Width::Bits8);

    c.bench_function("engine_frame_latency_16", |b| {
        b.iter(|| {
            engine.submit(Frame::new(payload.clone())).unwrap();
            black_box(engine.recv(Duration::from_secs(1)).unwrap())
        });
    });
}

/// Benchmark: 32 frames in flight, then drain.
fn bench_engine_burst_32(c: &mut Criterion) {
    let engine = FrameEngine::start(reference_engine(Width::Bits32)).unwrap();
    let frames: Vec<Vec<u64>> = (0..32)
        .map(|i| seeded_payload(i, 1 + (i as usize % 16), Width::Bits8))
        .collect();

    c.bench_function("engine_burst_32", |b| {
        b.iter(|| {
            for f in &frames {
                engine.submit(Frame::new(f.clone())).unwrap();
            }
            for _ in 0..frames.len() {
                black_box(engine.recv(Duration::from_secs(1)).unwrap());
            }
        });
    });
}

criterion_group!(benches, bench_engine_frame_latency, bench_engine_burst_32);
criterion_main!(benches);
