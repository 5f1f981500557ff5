//! Kit Builder (spec section 4.8): turns a validated [`Value`] tree into
//! a playable [`DrumFont`] — paths resolved, velocity layers sorted and
//! bound-partitioned, waves loaded, note map populated.
//!
//! Grounded on `original_source/DrumFont/DrumKit.cpp`'s `FinishPaths`/
//! `BuildNoteMap` and `MultiLayeredDrum.cpp`'s `SortLayers`.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::audio::soundfile::{ScaleCode, SoundFile};
use crate::audio::wave::InMemoryWave;
use crate::error::KitBuildError;
use crate::font::Value;

use super::model::{Drum, DrumFont, Kit, Robin, VelocityLayer};
use super::robin::RobinManager;

fn joined_path(base: &Path, child: Option<&str>) -> PathBuf {
    match child {
        Some(c) if !c.is_empty() => base.join(c),
        _ => base.to_path_buf(),
    }
}

/// Build every kit in `tree`. `font_dir` anchors relative paths;
/// `output_rate` is baked into each loaded wave's resampling ratio;
/// `au_naturale` selects the robin scale code (spec section 4.8 step 7,
/// supplemented "au naturale flag").
pub fn build(
    tree: &Value,
    font_dir: &Path,
    output_rate: f64,
    au_naturale: bool,
) -> Result<DrumFont, KitBuildError> {
    let mut kits = Vec::new();
    let mut total_load_failures = 0usize;

    if let Some(top) = tree.as_object() {
        for (kit_name, kit_value) in top {
            let kit = build_kit(kit_name, kit_value, font_dir, output_rate, au_naturale, &mut total_load_failures)?;
            kits.push(kit);
        }
    }

    if total_load_failures > 0 {
        return Err(KitBuildError::RobinLoadFailures { count: total_load_failures });
    }

    Ok(DrumFont { kits, au_naturale })
}

fn build_kit(
    name: &str,
    kit_value: &Value,
    font_dir: &Path,
    output_rate: f64,
    au_naturale: bool,
    load_failures: &mut usize,
) -> Result<Kit, KitBuildError> {
    let kit_path = kit_value.get("path").and_then(Value::as_str);
    let cumulative_path = joined_path(font_dir, kit_path);

    let mut drums = Vec::new();
    if let Some(instruments) = kit_value.get("instruments").and_then(Value::as_object) {
        for (drum_name, drum_value) in instruments {
            let drum = build_drum(drum_name, drum_value, &cumulative_path, output_rate, au_naturale, load_failures)?;
            drums.push(drum);
        }
    }

    let mut note_map: [Option<usize>; 128] = [None; 128];
    for (i, drum) in drums.iter().enumerate() {
        let note = drum.midi_note as usize;
        match note_map[note] {
            None => note_map[note] = Some(i),
            Some(existing) => {
                return Err(KitBuildError::DuplicateNoteMapping {
                    note: drum.midi_note,
                    first: drums[existing].name.clone(),
                    second: drum.name.clone(),
                });
            }
        }
    }

    Ok(Kit {
        name: name.to_string(),
        base_path: font_dir.to_path_buf(),
        cumulative_path,
        drums,
        note_map,
    })
}

fn build_drum(
    name: &str,
    drum_value: &Value,
    kit_path: &Path,
    output_rate: f64,
    au_naturale: bool,
    load_failures: &mut usize,
) -> Result<Drum, KitBuildError> {
    let drum_path = drum_value.get("path").and_then(Value::as_str);
    let cumulative_path = joined_path(kit_path, drum_path);

    let midi_note = drum_value
        .get("note")
        .and_then(Value::as_number)
        .map(|n| n.x() as u8)
        .unwrap_or(0);

    let mut layers = Vec::new();
    if let Some(velocities) = drum_value.get("velocities").and_then(Value::as_array) {
        // Each element is `vNN = { ... }` (spec section 6): a NameValue
        // whose name carries the velocity code.
        for element in velocities {
            if let Value::NameValue(layer_name, layer_value) = element {
                let vel_code: u8 = layer_name.strip_prefix('v').and_then(|d| d.parse().ok()).unwrap_or(0);
                let layer = build_layer(vel_code, layer_value, &cumulative_path, output_rate, au_naturale, load_failures);
                layers.push(layer);
            }
        }
    }

    layers.sort_by_key(|l: &VelocityLayer| l.vel_code);
    partition_bounds(&mut layers);

    Ok(Drum {
        name: name.to_string(),
        midi_note,
        cumulative_path,
        velocity_layers: layers,
    })
}

/// Force the first layer's min to 0, the last layer's max to 127, and
/// each interior layer's max to the next layer's min minus one (spec
/// section 4.8 step 5 / `MultiLayeredDrum::SortLayers`).
fn partition_bounds(layers: &mut [VelocityLayer]) {
    let n = layers.len();
    if n == 0 {
        return;
    }
    for i in 0..n {
        layers[i].min_vel = layers[i].vel_code;
    }
    layers[0].min_vel = 0;
    for i in 0..n - 1 {
        layers[i].max_vel = layers[i + 1].min_vel.saturating_sub(1);
    }
    layers[n - 1].max_vel = 127;
    for layer in layers.iter_mut() {
        layer.fmin = layer.min_vel as f64 / 127.0;
        layer.fmax = layer.max_vel as f64 / 127.0;
    }
}

fn build_layer(
    vel_code: u8,
    layer_value: &Value,
    drum_path: &Path,
    output_rate: f64,
    au_naturale: bool,
    load_failures: &mut usize,
) -> VelocityLayer {
    let layer_path = layer_value.get("path").and_then(Value::as_str);
    let cumulative_path = joined_path(drum_path, layer_path);

    let mut robins = Vec::new();
    if let Some(robin_values) = layer_value.get("robins").and_then(Value::as_array) {
        // Each element is `rN = { ... }` or a bare `{ ... }`; the name
        // (if any) is cosmetic.
        for element in robin_values {
            let robin_value = match element {
                Value::NameValue(_, boxed) => boxed.as_ref(),
                other => other,
            };
            robins.push(build_robin(robin_value, &cumulative_path, output_rate, au_naturale, load_failures));
        }
    }

    let robin_mgr = RobinManager::new(robins.len());
    VelocityLayer {
        vel_code,
        min_vel: vel_code,
        max_vel: vel_code,
        fmin: vel_code as f64 / 127.0,
        fmax: vel_code as f64 / 127.0,
        cumulative_path,
        robins,
        robin_mgr,
    }
}

fn build_robin(
    robin_value: &Value,
    layer_path: &Path,
    output_rate: f64,
    au_naturale: bool,
    load_failures: &mut usize,
) -> Robin {
    let file_name = robin_value.get("fname").and_then(Value::as_str).unwrap_or("").to_string();
    let full_path = layer_path.join(&file_name);
    let peak = robin_value.get("peak").and_then(Value::as_number).map(|n| n.x());
    let rms = robin_value.get("rms").and_then(Value::as_number).map(|n| n.x());
    let start_frame = robin_value.get("offset").and_then(Value::as_number).map(|n| n.x() as u32);

    let scale = if au_naturale {
        ScaleCode::FullScale
    } else {
        match peak {
            Some(p) if p > 0.0 => ScaleCode::Scaled(1.0 / p),
            _ => ScaleCode::FullScale,
        }
    };

    let wave = load_wave(&full_path, start_frame, scale, output_rate).unwrap_or_else(|e| {
        warn!(path = %full_path.display(), error = %e, "failed to load robin sample");
        *load_failures += 1;
        InMemoryWave::new(
            crate::audio::buffer::SampleBuffer::empty(crate::audio::buffer::Channels::Mono),
            output_rate,
        )
    });

    Robin {
        file_name,
        full_path,
        peak,
        rms,
        start_frame,
        end_frame: None,
        wave,
    }
}

fn load_wave(
    path: &Path,
    start_frame: Option<u32>,
    scale: ScaleCode,
    output_rate: f64,
) -> Result<InMemoryWave, crate::error::SoundFileError> {
    let mut sf = SoundFile::open(path)?;
    let start = start_frame.unwrap_or(0) as u64;
    let end = sf.frame_count();
    let buffer = sf.read(start, end, scale)?;
    Ok(InMemoryWave::new(buffer, output_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::parser;

    fn write_wav(path: &Path, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn builds_note_map_and_partitions_layer_bounds() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("snare1.wav"), &[0, 16384, -16384]);
        write_wav(&dir.path().join("snare2.wav"), &[0, 8000]);

        let tree = parser::parse(
            r#"{
                MyKit = {
                    instruments = {
                        snare = {
                            note = 38,
                            velocities = [
                                v32 = { robins = [ { fname = "snare2.wav" } ] },
                                v96 = { robins = [ { fname = "snare1.wav" } ] }
                            ]
                        }
                    }
                }
            }"#,
        )
        .unwrap();

        let font = build(&tree, dir.path(), 44_100.0, true).unwrap();
        let kit = font.kit_by_name("MyKit").unwrap();
        let drum = kit.drum_for_note(38).unwrap();

        assert_eq!(drum.velocity_layers.len(), 2);
        assert_eq!(drum.velocity_layers[0].min_vel, 0);
        assert_eq!(drum.velocity_layers[0].max_vel, 95);
        assert_eq!(drum.velocity_layers[1].min_vel, 96);
        assert_eq!(drum.velocity_layers[1].max_vel, 127);
    }

    #[test]
    fn duplicate_note_mapping_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("a.wav"), &[0, 1]);

        let tree = parser::parse(
            r#"{
                MyKit = {
                    instruments = {
                        snare = { note = 38, velocities = [ v64 = { robins = [ { fname = "a.wav" } ] } ] },
                        rim   = { note = 38, velocities = [ v64 = { robins = [ { fname = "a.wav" } ] } ] }
                    }
                }
            }"#,
        )
        .unwrap();

        let err = build(&tree, dir.path(), 44_100.0, true).unwrap_err();
        assert!(matches!(err, KitBuildError::DuplicateNoteMapping { .. }));
    }
}
