//! Line reading benchmarks
//!
//! Compares passthrough and converting character layers, with and without
//! universal newline normalization.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use encoding_rs::{SHIFT_JIS, UTF_8};
use oxiio_core::adapters::MemorySource;
use oxiio_core::{BufferedIo, Mode, Outcome};
use oxiio_text::{CharacterIo, LineOptions, Newline, TextReader};
use std::hint::black_box;

const DATA_SIZE: usize = 256 * 1024;

fn text_lines(size: usize, newline: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(size + 64);
    while data.len() < size {
        data.extend_from_slice(b"The quick brown fox jumps over the lazy dog.");
        data.extend_from_slice(newline);
    }
    data
}

fn count_lines(data: &[u8], chars: &mut CharacterIo, newline: Newline) -> usize {
    let mut io = BufferedIo::new(MemorySource::reader(data.to_vec()));
    let mut reader = TextReader::new(chars, &mut io, newline, Mode::Blocking);
    let mut count = 0;
    while let Outcome::Ready(line) = reader.read_line(&LineOptions::DEFAULT).unwrap() {
        count += line.len();
    }
    count
}

fn bench_read_lines(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_lines");
    group.throughput(Throughput::Bytes(DATA_SIZE as u64));

    let lf = text_lines(DATA_SIZE, b"\n");
    let crlf = text_lines(DATA_SIZE, b"\r\n");

    group.bench_with_input(BenchmarkId::new("passthrough", "lf"), &lf, |b, data| {
        b.iter(|| {
            let mut chars = CharacterIo::default();
            black_box(count_lines(data, &mut chars, Newline::None))
        });
    });

    group.bench_with_input(BenchmarkId::new("passthrough", "crlf_universal"), &crlf, |b, data| {
        b.iter(|| {
            let mut chars = CharacterIo::default();
            black_box(count_lines(data, &mut chars, Newline::Universal))
        });
    });

    group.bench_with_input(BenchmarkId::new("converter", "utf8"), &lf, |b, data| {
        b.iter(|| {
            let mut chars = CharacterIo::select(Some(UTF_8), Some(UTF_8)).unwrap();
            black_box(count_lines(data, &mut chars, Newline::None))
        });
    });

    group.bench_with_input(BenchmarkId::new("converter", "shift_jis"), &lf, |b, data| {
        b.iter(|| {
            let mut chars = CharacterIo::select(Some(SHIFT_JIS), Some(UTF_8)).unwrap();
            black_box(count_lines(data, &mut chars, Newline::None))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_read_lines);
criterion_main!(benches);
