//! Poly Drummer (spec section 4.11): velocity-to-layer selection and
//! polyphonic note dispatch over a [`VoiceTable`].
//!
//! Grounded on `original_source/DrumFont/PolyDrummer.cpp`'s
//! `noteOnDirect`/`StereoTick`. Two redesigns from the original, per the
//! REDESIGN FLAGS: the note lookup goes straight through
//! [`Kit::drum_for_note`] instead of the original's hardcoded
//! `pianoKeyToDrumMap` table, and an unmapped note now deactivates the
//! slot it was given instead of leaking it; `stereo_tick` applies the
//! voice gain, which the original left as a `@@ TODO`.
//!
//! The Kit is owned outright rather than shared: the robin round-robin
//! cursor in each velocity layer advances on every `note_on`, so only a
//! single `PolyDrummer` may hold a given `Kit` at a time.

use crate::audio::buffer::StereoFrame;
use crate::audio::wave::InMemoryWave;
use crate::kit::Kit;

use super::voice_table::VoiceTable;

pub struct PolyDrummer {
    kit: Kit,
    voices: VoiceTable,
    /// If true, a note-on for a note already sounding resets that voice
    /// in place instead of allocating a new one.
    pub interrupt_same_note: bool,
}

impl PolyDrummer {
    pub fn new(kit: Kit, polyphony: usize) -> Self {
        let silent = InMemoryWave::new(
            crate::audio::buffer::SampleBuffer::empty(crate::audio::buffer::Channels::Stereo),
            48_000.0,
        );
        PolyDrummer {
            kit,
            voices: VoiceTable::new(polyphony, silent),
            interrupt_same_note: false,
        }
    }

    pub fn kit(&self) -> &Kit {
        &self.kit
    }

    pub fn has_sounds_to_play(&self) -> bool {
        self.voices.has_active()
    }

    /// Notes currently sounding, youngest to oldest. Grounded on
    /// `original_source/DrumFont/PolyTable.cpp`'s `DumpActive`, used here
    /// for testing rather than debug output.
    pub fn active_notes(&self) -> Vec<u8> {
        self.voices
            .iter_active()
            .filter_map(|s| self.voices.slot(s).sound_number)
            .collect()
    }

    /// Dispatch a note-on. `velocity` is a fraction in `[0, 1]`.
    pub fn note_on(&mut self, midi_note: u8, velocity: f64) {
        if self.interrupt_same_note {
            if let Some(slot) = self.voices.find_active_by_note(midi_note) {
                let voice = self.voices.slot_mut(slot);
                voice.wave.reset();
                voice.gain = velocity;
                return;
            }
        }

        let slot = self.voices.activate(midi_note);

        let Some(drum) = self.kit.drum_for_note_mut(midi_note) else {
            self.voices.deactivate(slot);
            return;
        };

        let Some(layer) = drum.select_layer_mut(velocity) else {
            self.voices.deactivate(slot);
            return;
        };

        let template = layer.choose_wave();
        let voice = self.voices.slot_mut(slot);
        voice.wave.alias_samples(template);
        voice.wave.reset();
        voice.gain = velocity;
    }

    pub fn stereo_tick(&mut self) -> StereoFrame {
        let mut left = 0.0;
        let mut right = 0.0;

        let active: Vec<usize> = self.voices.iter_active().collect();
        for slot in active {
            if self.voices.slot(slot).wave.is_finished() {
                self.voices.deactivate(slot);
                continue;
            }
            let voice = self.voices.slot_mut(slot);
            let frame = voice.wave.stereo_tick();
            left += frame.left * voice.gain;
            right += frame.right * voice.gain;
        }

        StereoFrame { left, right }
    }
}
