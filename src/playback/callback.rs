//! Playback Callback (spec section 4.12): the real-time glue between the
//! MIDI input queue, the [`PolyDrummer`], and the audio driver. Invoked
//! on the driver's own thread; never allocates, locks, or performs I/O.

use crate::audio::buffer::StereoFrame;

use super::midi::MidiConsumer;
use super::poly_drummer::PolyDrummer;

/// MIDI is drained and re-checked every `CHUNK_FRAMES` output frames,
/// bounding note-on latency to under ~0.3ms at 48kHz (spec section 4.12
/// step 1) without dominating CPU on a per-frame poll.
pub const CHUNK_FRAMES: usize = 16;

/// Returned by [`PlaybackCallback::fill`]: 0 to keep the stream running,
/// 2 to signal the driver to stop (spec section 5 cancellation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCode {
    Continue = 0,
    Stop = 2,
}

pub struct PlaybackCallback {
    drummer: PolyDrummer,
    midi_in: MidiConsumer,
    /// Linear gain applied to every mixed frame; spec default is -6dB
    /// (`10^(-6/20)`) to prevent clipping under full polyphony.
    pub attenuation: f64,
    stop_requested: bool,
}

pub const DEFAULT_ATTENUATION_DB: f64 = -6.0;

pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

impl PlaybackCallback {
    pub fn new(drummer: PolyDrummer, midi_in: MidiConsumer) -> Self {
        PlaybackCallback {
            drummer,
            midi_in,
            attenuation: db_to_linear(DEFAULT_ATTENUATION_DB),
            stop_requested: false,
        }
    }

    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Fill `output` (interleaved stereo, `output.len()` must be even)
    /// with `output.len() / 2` frames, draining MIDI in chunks of up to
    /// [`CHUNK_FRAMES`] frames between checks.
    pub fn fill(&mut self, output: &mut [f64]) -> ControlCode {
        debug_assert_eq!(output.len() % 2, 0);
        let total_frames = output.len() / 2;
        let mut produced = 0;

        while produced < total_frames {
            self.drain_midi();

            let chunk = (total_frames - produced).min(CHUNK_FRAMES);
            for i in 0..chunk {
                let frame = if self.drummer.has_sounds_to_play() {
                    self.drummer.stereo_tick()
                } else {
                    StereoFrame { left: 0.0, right: 0.0 }
                };
                let idx = (produced + i) * 2;
                output[idx] = frame.left * self.attenuation;
                output[idx + 1] = frame.right * self.attenuation;
            }
            produced += chunk;
        }

        if self.stop_requested {
            ControlCode::Stop
        } else {
            ControlCode::Continue
        }
    }

    fn drain_midi(&mut self) {
        while let Some(message) = self.midi_in.pop() {
            if let Some((note, velocity)) = message.as_note_on() {
                self.drummer.note_on(note, velocity as f64 / 127.0);
            }
        }
    }
}
