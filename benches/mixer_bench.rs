//! Poly Drummer mixdown throughput under full polyphony.
//!
//! **Target:** `stereo_tick` over 16 simultaneous voices should stay far
//! below one output-frame period so the Playback Callback never falls
//! behind the audio driver.

use std::path::PathBuf;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dfx_player::audio::buffer::{Channels, SampleBuffer};
use dfx_player::audio::wave::InMemoryWave;
use dfx_player::kit::{Drum, Kit, Robin, RobinManager, VelocityLayer};
use dfx_player::playback::PolyDrummer;

fn one_drum_kit() -> Kit {
    let samples: Vec<f64> = (0..48_000 * 2).map(|i| (i as f64 * 0.001).sin()).collect();
    let buf = SampleBuffer::from_samples(samples, Channels::Stereo, 48_000.0);
    let wave = InMemoryWave::new(buf, 48_000.0);

    let robin = Robin {
        file_name: "hit.wav".into(),
        full_path: PathBuf::from("hit.wav"),
        peak: None,
        rms: None,
        start_frame: None,
        end_frame: None,
        wave,
    };
    let layer = VelocityLayer {
        vel_code: 0,
        min_vel: 0,
        max_vel: 127,
        fmin: 0.0,
        fmax: 1.0,
        cumulative_path: PathBuf::new(),
        robins: vec![robin],
        robin_mgr: RobinManager::new(1),
    };
    let drum = Drum {
        name: "snare".into(),
        midi_note: 38,
        cumulative_path: PathBuf::new(),
        velocity_layers: vec![layer],
    };
    let mut note_map = [None; 128];
    note_map[38] = Some(0);
    Kit {
        name: "Kit".into(),
        base_path: PathBuf::new(),
        cumulative_path: PathBuf::new(),
        drums: vec![drum],
        note_map,
    }
}

fn bench_poly_drummer(c: &mut Criterion) {
    let mut group = c.benchmark_group("poly_drummer");

    group.bench_function("stereo_tick_full_polyphony_16", |b| {
        let mut drummer = PolyDrummer::new(one_drum_kit(), 16);
        for _ in 0..16 {
            drummer.note_on(38, 1.0);
        }
        b.iter(|| black_box(drummer.stereo_tick()));
    });

    group.finish();
}

criterion_group!(benches, bench_poly_drummer);
criterion_main!(benches);
