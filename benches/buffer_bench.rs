//! Sample Buffer access performance.
//!
//! **Goal:** frame and interpolated access should be nearly free relative
//! to a single output-buffer period.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dfx_player::audio::buffer::{Channels, SampleBuffer};

fn bench_sample_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_buffer");

    let samples: Vec<f64> = (0..48_000 * 2).map(|i| (i as f64 * 0.001).sin()).collect();
    let stereo = SampleBuffer::from_samples(samples, Channels::Stereo, 48_000.0);

    group.bench_function("stereo_frame", |b| {
        b.iter(|| black_box(stereo.stereo_frame(black_box(1000))));
    });

    group.bench_function("stereo_interpolate", |b| {
        b.iter(|| black_box(stereo.stereo_interpolate(black_box(1000.37))));
    });

    group.bench_function("find_max", |b| {
        b.iter(|| black_box(stereo.find_max(black_box(0.0))));
    });

    group.bench_function("windowed_rms", |b| {
        b.iter(|| black_box(stereo.windowed_rms()));
    });

    group.finish();
}

criterion_group!(benches, bench_sample_buffer);
criterion_main!(benches);
