//! In-Memory Wave (spec section 4.3): a playback cursor over a
//! [`SampleBuffer`] with a resampling ratio between the buffer's native
//! rate and the output rate.
//!
//! Grounded on `original_source/DrumFont/MemWave.cpp`: `SetRate`'s
//! `delta = native_rate / out_rate` and `interpolate = delta mod 1 !=
//! 0`, and the tick methods' finished-latch ordering (check-before-read,
//! not after).

use super::buffer::{Channels, SampleBuffer, StereoFrame};

#[derive(Debug, Clone)]
pub struct InMemoryWave {
    buffer: SampleBuffer,
    output_rate: f64,
    delta: f64,
    interpolate: bool,
    time: f64,
    finished: bool,
}

impl InMemoryWave {
    /// Build a cursor over `buffer`, already resolved to `output_rate`.
    pub fn new(buffer: SampleBuffer, output_rate: f64) -> Self {
        let mut wave = InMemoryWave {
            buffer,
            output_rate,
            delta: 1.0,
            interpolate: false,
            time: 0.0,
            finished: false,
        };
        wave.set_rate(output_rate);
        wave
    }

    pub fn set_rate(&mut self, output_rate: f64) {
        self.output_rate = output_rate;
        self.delta = self.buffer.data_rate() / output_rate;
        self.interpolate = self.delta % 1.0 != 0.0;
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
        self.finished = false;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Share `other`'s sample storage and re-derive the rate ratio for
    /// this wave's output rate — used when a voice is assigned a robin
    /// (spec section 4.3's `alias_samples`).
    pub fn alias_samples(&mut self, other: &InMemoryWave) {
        self.buffer = other.buffer.alias();
        self.set_rate(self.output_rate);
    }

    fn frame_count(&self) -> usize {
        self.buffer.frame_count()
    }

    pub fn mono_tick(&mut self) -> f64 {
        debug_assert_eq!(self.buffer.channels(), Channels::Mono);
        if self.finished {
            return 0.0;
        }
        let last = self.frame_count() as f64 - 1.0;
        if self.time > last {
            self.time = last;
            self.finished = true;
            return 0.0;
        }
        let sample = if self.interpolate {
            self.buffer.mono_interpolate(self.time)
        } else {
            self.buffer.mono_frame(self.time as usize)
        };
        self.time += self.delta;
        sample
    }

    pub fn stereo_tick(&mut self) -> StereoFrame {
        debug_assert_eq!(self.buffer.channels(), Channels::Stereo);
        if self.finished {
            return StereoFrame { left: 0.0, right: 0.0 };
        }
        let last = self.frame_count() as f64 - 1.0;
        if self.time > last {
            self.time = last;
            self.finished = true;
            return StereoFrame { left: 0.0, right: 0.0 };
        }
        let frame = if self.interpolate {
            self.buffer.stereo_interpolate(self.time)
        } else {
            self.buffer.stereo_frame(self.time as usize)
        };
        self.time += self.delta;
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono_wave(samples: &[f64], native_rate: f64, output_rate: f64) -> InMemoryWave {
        let buf = SampleBuffer::from_samples(samples.to_vec(), Channels::Mono, native_rate);
        InMemoryWave::new(buf, output_rate)
    }

    #[test]
    fn matched_rates_skip_interpolation() {
        let wave = mono_wave(&[0.0, 1.0, 2.0], 48_000.0, 48_000.0);
        assert!(!wave.interpolate);
        assert_eq!(wave.delta, 1.0);
    }

    #[test]
    fn mismatched_rates_interpolate() {
        let wave = mono_wave(&[0.0, 1.0, 2.0], 44_100.0, 48_000.0);
        assert!(wave.interpolate);
    }

    #[test]
    fn tick_advances_and_latches_finished_past_last_frame() {
        let mut wave = mono_wave(&[1.0, 2.0, 3.0], 48_000.0, 48_000.0);
        assert_eq!(wave.mono_tick(), 1.0);
        assert_eq!(wave.mono_tick(), 2.0);
        assert_eq!(wave.mono_tick(), 3.0);
        assert!(!wave.is_finished());
        assert_eq!(wave.mono_tick(), 0.0);
        assert!(wave.is_finished());
        assert_eq!(wave.mono_tick(), 0.0);
    }

    #[test]
    fn reset_clears_position_and_finished_flag() {
        let mut wave = mono_wave(&[1.0, 2.0], 48_000.0, 48_000.0);
        wave.mono_tick();
        wave.mono_tick();
        wave.mono_tick();
        assert!(wave.is_finished());
        wave.reset();
        assert!(!wave.is_finished());
        assert_eq!(wave.mono_tick(), 1.0);
    }

    #[test]
    fn alias_samples_shares_buffer_and_rederives_ratio() {
        let template = mono_wave(&[5.0, 6.0, 7.0], 44_100.0, 48_000.0);
        let mut voice = mono_wave(&[0.0], 48_000.0, 48_000.0);
        voice.alias_samples(&template);
        assert!(voice.interpolate);
        assert_eq!(voice.frame_count(), 3);
    }
}
