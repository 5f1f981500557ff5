//! In-Memory Wave tick throughput.
//!
//! **Target:** a single tick must stay far below one output-frame period
//! (~20.8us at 48kHz) since hundreds of voices may tick per callback.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dfx_player::audio::buffer::{Channels, SampleBuffer};
use dfx_player::audio::wave::InMemoryWave;

fn bench_wave_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("in_memory_wave");

    let samples: Vec<f64> = (0..48_000 * 2).map(|i| (i as f64 * 0.001).sin()).collect();

    group.bench_function("stereo_tick_matched_rate", |b| {
        let buf = SampleBuffer::from_samples(samples.clone(), Channels::Stereo, 48_000.0);
        let mut wave = InMemoryWave::new(buf, 48_000.0);
        b.iter(|| {
            let frame = wave.stereo_tick();
            if wave.is_finished() {
                wave.reset();
            }
            black_box(frame)
        });
    });

    group.bench_function("stereo_tick_resampled", |b| {
        let buf = SampleBuffer::from_samples(samples.clone(), Channels::Stereo, 44_100.0);
        let mut wave = InMemoryWave::new(buf, 48_000.0);
        b.iter(|| {
            let frame = wave.stereo_tick();
            if wave.is_finished() {
                wave.reset();
            }
            black_box(frame)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_wave_tick);
criterion_main!(benches);
