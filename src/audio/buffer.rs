//! Sample Buffer (spec section 4.1): an immutable-after-construction,
//! reference-counted store of interleaved floating-point PCM frames with
//! indexed and linearly-interpolated access.
//!
//! Grounded on `original_source/DfxUtil/FrameBuffer.h`'s `FrameBuffer<T>`
//! template, specialized to `f64` and split into mono/stereo accessors
//! the way the original splits `GetMonoFrame`/`GetStereoFrame`. Sharing
//! uses `Arc` where the original uses `shared_ptr<T[]>` plus an explicit
//! `Alias()` method.

use std::sync::Arc;

/// One channel count this buffer can hold. The player only ever deals
/// in mono source material mixed to a stereo bus, so only these two are
/// supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    pub fn count(self) -> usize {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StereoFrame {
    pub left: f64,
    pub right: f64,
}

/// Interleaved PCM frames, read-only once built. Cheap to clone — the
/// sample storage is `Arc`-shared, mirroring the original's aliasing.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Arc<[f64]>,
    frame_count: usize,
    channels: Channels,
    data_rate: f64,
}

impl SampleBuffer {
    pub fn empty(channels: Channels) -> Self {
        SampleBuffer {
            samples: Arc::from(Vec::new().into_boxed_slice()),
            frame_count: 0,
            channels,
            data_rate: 44_100.0,
        }
    }

    /// Build from an already-deinterleaved flat sample vector. Panics if
    /// `samples.len()` isn't a multiple of the channel count, since that
    /// would violate the buffer's core invariant (spec section 3).
    pub fn from_samples(samples: Vec<f64>, channels: Channels, data_rate: f64) -> Self {
        let stride = channels.count();
        assert!(samples.len() % stride == 0, "sample count not a multiple of channel count");
        SampleBuffer {
            frame_count: samples.len() / stride,
            samples: Arc::from(samples.into_boxed_slice()),
            channels,
            data_rate,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn data_rate(&self) -> f64 {
        self.data_rate
    }

    pub fn is_empty(&self) -> bool {
        self.frame_count == 0
    }

    /// Share this buffer's storage with another handle (the Kit
    /// Builder's robin-to-voice aliasing, spec section 4.3's
    /// `alias_samples`). Cloning an `Arc` is exactly the original's
    /// `Alias()`.
    pub fn alias(&self) -> Self {
        self.clone()
    }

    pub fn mono_frame(&self, i: usize) -> f64 {
        debug_assert_eq!(self.channels, Channels::Mono);
        debug_assert!(i < self.frame_count, "mono_frame index out of bounds");
        self.samples[i]
    }

    pub fn stereo_frame(&self, i: usize) -> StereoFrame {
        debug_assert_eq!(self.channels, Channels::Stereo);
        debug_assert!(i < self.frame_count, "stereo_frame index out of bounds");
        let base = i * 2;
        StereoFrame {
            left: self.samples[base],
            right: self.samples[base + 1],
        }
    }

    /// Linear-interpolated mono access at fractional frame position `p`.
    /// `p` must be within `[0, frame_count)`; out of range is a
    /// programming error per spec section 4.1.
    pub fn mono_interpolate(&self, p: f64) -> f64 {
        debug_assert_eq!(self.channels, Channels::Mono);
        debug_assert!(p >= 0.0 && p < self.frame_count as f64, "mono_interpolate position out of bounds");
        let i = p.floor() as usize;
        let f = p - i as f64;
        if f == 0.0 || i == self.frame_count - 1 {
            return self.samples[i];
        }
        let a = self.samples[i];
        let b = self.samples[i + 1];
        a + f * (b - a)
    }

    pub fn stereo_interpolate(&self, p: f64) -> StereoFrame {
        debug_assert_eq!(self.channels, Channels::Stereo);
        debug_assert!(p >= 0.0 && p < self.frame_count as f64, "stereo_interpolate position out of bounds");
        let i = p.floor() as usize;
        let f = p - i as f64;
        if f == 0.0 || i == self.frame_count - 1 {
            return self.stereo_frame(i);
        }
        let a = self.stereo_frame(i);
        let b = self.stereo_frame(i + 1);
        StereoFrame {
            left: a.left + f * (b.left - a.left),
            right: a.right + f * (b.right - a.right),
        }
    }

    /// Absolute peak over the first `duration` seconds (or the whole
    /// buffer if `duration <= 0`), used by the Kit Builder's optional
    /// peak cross-check (spec section 4.1's offline statistics,
    /// supplemented as library primitives rather than a standalone
    /// tool).
    pub fn find_max(&self, duration: f64) -> f64 {
        let n_frames_to_do = if duration > 0.0 {
            ((duration * self.data_rate + 0.5) as usize).min(self.frame_count)
        } else {
            self.frame_count
        };
        let n_samples = n_frames_to_do * self.channels.count();
        self.samples[..n_samples]
            .iter()
            .fold(0.0_f64, |peak, &x| peak.max(x.abs()))
    }

    /// Windowed RMS over the signal's middle section: skip leading and
    /// trailing near-silence (below `1e-4`), then average the RMS of
    /// 100-sample chunks whose own RMS exceeds `peak / 100`.
    pub fn windowed_rms(&self) -> f64 {
        const SILENCE: f64 = 1e-4;
        const CHUNK: usize = 100;

        if self.samples.is_empty() {
            return 0.0;
        }

        let peak = self.find_max(0.0);
        if peak == 0.0 {
            return 0.0;
        }

        let start = self.samples.iter().position(|&x| x.abs() >= SILENCE).unwrap_or(0);
        let end = self
            .samples
            .iter()
            .rposition(|&x| x.abs() >= SILENCE)
            .map(|i| i + 1)
            .unwrap_or(self.samples.len());
        if start >= end {
            return 0.0;
        }

        let threshold = peak / 100.0;
        let mut sum = 0.0;
        let mut count = 0usize;
        let mut i = start;
        while i < end {
            let chunk_end = (i + CHUNK).min(end);
            let chunk = &self.samples[i..chunk_end];
            let chunk_rms = (chunk.iter().map(|x| x * x).sum::<f64>() / chunk.len() as f64).sqrt();
            if chunk_rms > threshold {
                sum += chunk_rms;
                count += 1;
            }
            i = chunk_end;
        }

        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(samples: &[f64]) -> SampleBuffer {
        SampleBuffer::from_samples(samples.to_vec(), Channels::Mono, 44_100.0)
    }

    #[test]
    fn mono_interpolate_is_exact_at_integer_positions() {
        let buf = mono(&[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(buf.mono_interpolate(2.0), 2.0);
    }

    #[test]
    fn mono_interpolate_averages_at_half_way() {
        let buf = mono(&[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(buf.mono_interpolate(0.5), 0.5);
        assert_eq!(buf.mono_interpolate(2.5), 2.5);
    }

    #[test]
    fn mono_interpolate_does_not_extrapolate_past_last_frame() {
        let buf = mono(&[0.0, 1.0, 2.0]);
        assert_eq!(buf.mono_interpolate(2.0), 2.0);
    }

    #[test]
    fn stereo_interpolate_is_channel_wise() {
        let buf = SampleBuffer::from_samples(vec![0.0, 0.0, 2.0, 4.0], Channels::Stereo, 44_100.0);
        let mid = buf.stereo_interpolate(0.5);
        assert_eq!(mid.left, 1.0);
        assert_eq!(mid.right, 2.0);
    }

    #[test]
    fn find_max_respects_duration_window() {
        let buf = SampleBuffer::from_samples(vec![0.1, 0.9, 0.1, 0.1], Channels::Mono, 2.0);
        // 1 second window at rate 2.0 Hz covers the first 2 frames.
        assert_eq!(buf.find_max(1.0), 0.9);
    }

    #[test]
    fn alias_shares_storage() {
        let buf = mono(&[1.0, 2.0, 3.0]);
        let aliased = buf.alias();
        assert_eq!(aliased.frame_count(), buf.frame_count());
        assert_eq!(aliased.mono_frame(1), 2.0);
    }

    #[test]
    fn windowed_rms_skips_silence_and_low_energy_chunks() {
        let mut samples = vec![0.0; 50];
        samples.extend(std::iter::repeat(0.5).take(200));
        samples.extend(vec![0.0; 50]);
        let buf = mono(&samples);
        let rms = buf.windowed_rms();
        assert!(rms > 0.0 && rms <= 0.5);
    }
}
