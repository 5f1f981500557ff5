//! Kit data model (spec section 3): Kit, Drum, Velocity Layer, Robin.
//!
//! These are built once by the [`builder`](super::builder) and then
//! owned outright by the single
//! [`PolyDrummer`](crate::playback::poly_drummer::PolyDrummer) that
//! plays them for the rest of the session.

use std::path::PathBuf;

use crate::audio::wave::InMemoryWave;

use super::robin::RobinManager;

/// One recorded take within a velocity layer.
#[derive(Debug, Clone)]
pub struct Robin {
    pub file_name: String,
    pub full_path: PathBuf,
    pub peak: Option<f64>,
    pub rms: Option<f64>,
    pub start_frame: Option<u32>,
    pub end_frame: Option<u32>,
    pub wave: InMemoryWave,
}

/// A velocity-banded group of round-robin alternates.
#[derive(Debug, Clone)]
pub struct VelocityLayer {
    /// The code as written in the font (e.g. `64` from `v64`).
    pub vel_code: u8,
    /// Resolved integer bounds after sorting (spec section 4.8 step 5).
    pub min_vel: u8,
    pub max_vel: u8,
    /// `[fmin, fmax] = [min_vel, max_vel] / 127`.
    pub fmin: f64,
    pub fmax: f64,
    pub cumulative_path: PathBuf,
    pub robins: Vec<Robin>,
    pub robin_mgr: RobinManager,
}

impl VelocityLayer {
    pub fn contains(&self, velocity: f64) -> bool {
        velocity >= self.fmin && velocity <= self.fmax
    }

    /// Advance the round-robin cursor and return the chosen wave
    /// template (spec section 4.9).
    pub fn choose_wave(&mut self) -> &InMemoryWave {
        let idx = self.robin_mgr.choose();
        &self.robins[idx].wave
    }
}

/// One playable drum: a MIDI note mapped to an ordered set of velocity
/// layers.
#[derive(Debug, Clone)]
pub struct Drum {
    pub name: String,
    pub midi_note: u8,
    pub cumulative_path: PathBuf,
    /// Sorted ascending by `vel_code`; bounds partition `[0, 127]`.
    pub velocity_layers: Vec<VelocityLayer>,
}

impl Drum {
    /// Select the layer covering `velocity` (a fraction in `[0, 1]`),
    /// via linear scan over the (small, already-sorted) layer list.
    pub fn select_layer(&self, velocity: f64) -> Option<&VelocityLayer> {
        self.velocity_layers.iter().find(|l| l.contains(velocity))
    }

    pub fn select_layer_mut(&mut self, velocity: f64) -> Option<&mut VelocityLayer> {
        self.velocity_layers.iter_mut().find(|l| l.contains(velocity))
    }
}

/// A fully resolved drum kit: drums plus a dense note-to-drum map.
#[derive(Debug, Clone)]
pub struct Kit {
    pub name: String,
    pub base_path: PathBuf,
    pub cumulative_path: PathBuf,
    pub drums: Vec<Drum>,
    /// `note_map[midi_note]` indexes into `drums`, or `None` if unmapped.
    pub note_map: [Option<usize>; 128],
}

impl Kit {
    pub fn drum_for_note(&self, midi_note: u8) -> Option<&Drum> {
        self.note_map[midi_note as usize].map(|i| &self.drums[i])
    }

    pub fn drum_for_note_mut(&mut self, midi_note: u8) -> Option<&mut Drum> {
        let idx = self.note_map[midi_note as usize]?;
        Some(&mut self.drums[idx])
    }
}

/// One or more kits parsed from a single font file.
#[derive(Debug, Clone)]
pub struct DrumFont {
    pub kits: Vec<Kit>,
    /// Raw scale vs. peak-normalized robin loading (spec section 4.8
    /// step 7, supplemented feature "au naturale flag").
    pub au_naturale: bool,
}

impl DrumFont {
    pub fn kit_by_name(&self, name: &str) -> Option<&Kit> {
        self.kits.iter().find(|k| k.name == name)
    }
}
