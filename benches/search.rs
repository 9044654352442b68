use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use janus::scoring::{disorder_score, disorder_score_ordered};
use janus::scramble::{row_sources, transform};
use janus::{CancelToken, Frame, Key, KeySearchEngine, ScrambleDirection, SearchBounds};

fn gradient_frame(height: usize, width: usize) -> Frame {
    Frame::from_fn(height, width, 3, |y, row| {
        for (i, byte) in row.iter_mut().enumerate() {
            *byte = ((y * 255 / height.max(1)) as u8).wrapping_add((i / 3 % 7) as u8);
        }
    })
}

fn bench_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");
    let key = Key::new(117, 42);

    for (name, width, height) in [("360p", 640, 360), ("720p", 1280, 720), ("1080p", 1920, 1080)] {
        let frame = gradient_frame(height, width);
        group.throughput(Throughput::Bytes(frame.as_bytes().len() as u64));
        group.bench_with_input(BenchmarkId::new("forward", name), &frame, |b, frame| {
            b.iter(|| transform(black_box(frame), key, ScrambleDirection::Forward));
        });
    }

    group.finish();
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("disorder_score");
    let frame = transform(&gradient_frame(720, 1280), Key::new(5, 9), ScrambleDirection::Forward);
    group.throughput(Throughput::Bytes(frame.as_bytes().len() as u64));

    group.bench_function("materialized", |b| {
        b.iter(|| {
            let candidate = transform(&frame, Key::new(5, 9), ScrambleDirection::Inverse);
            disorder_score(black_box(&candidate))
        });
    });

    let mut sources = Vec::new();
    group.bench_function("row_sources", |b| {
        b.iter(|| {
            row_sources(frame.height(), Key::new(5, 9), ScrambleDirection::Inverse, &mut sources);
            disorder_score_ordered(black_box(&frame), &sources)
        });
    });

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    let frame = transform(&gradient_frame(240, 320), Key::new(20, 11), ScrambleDirection::Forward);
    let bounds = SearchBounds::new(31, 31);
    group.throughput(Throughput::Elements(bounds.candidate_count() as u64));

    for threads in [1, 4] {
        let engine = KeySearchEngine::new(bounds, threads, 256).unwrap();
        group.bench_with_input(BenchmarkId::new("threads", threads), &engine, |b, engine| {
            b.iter(|| engine.search(Some(&frame), &CancelToken::new(), |_| {}));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_transform, bench_score, bench_search);
criterion_main!(benches);
