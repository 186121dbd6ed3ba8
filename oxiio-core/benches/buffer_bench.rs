//! Throughput benchmarks for the buffered layer
//!
//! Measures chunked reads through `BufferedIo` for several buffer capacities
//! and the cost of buffered small writes.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use oxiio_core::adapters::MemorySource;
use oxiio_core::{BufferedIo, Mode, Outcome};
use std::hint::black_box;

const DATA_SIZE: usize = 1024 * 1024;

fn text_like(size: usize) -> Vec<u8> {
    let text = b"The quick brown fox jumps over the lazy dog.\n";
    text.iter().copied().cycle().take(size).collect()
}

fn bench_buffered_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffered_read");
    let data = text_like(DATA_SIZE);
    group.throughput(Throughput::Bytes(DATA_SIZE as u64));

    for capacity in [512usize, 8 * 1024, 64 * 1024] {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &capacity| {
                b.iter(|| {
                    let source = MemorySource::reader(data.clone());
                    let mut io = BufferedIo::with_capacity(source, capacity).unwrap();
                    let mut buf = [0u8; 80];
                    let mut total = 0usize;
                    while let Outcome::Ready(n) = io.read(&mut buf, Mode::Blocking).unwrap() {
                        total += n;
                    }
                    black_box(total)
                });
            },
        );
    }

    group.finish();
}

fn bench_buffered_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffered_write");
    let line = b"The quick brown fox jumps over the lazy dog.\n";
    group.throughput(Throughput::Bytes((line.len() * 10_000) as u64));

    group.bench_function("small_writes", |b| {
        b.iter(|| {
            let mut io = BufferedIo::new(MemorySource::writer());
            for _ in 0..10_000 {
                io.write(black_box(line), Mode::Blocking).unwrap();
            }
            io.flush(Mode::Blocking).unwrap();
            black_box(io.source().contents().len())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_buffered_read, bench_buffered_write);
criterion_main!(benches);
