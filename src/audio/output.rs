//! Audio driver glue (spec section 5: "the audio driver's callback
//! thread"). Opens a `cpal` output device and drives a
//! [`PlaybackCallback`] from its stream callback.
//!
//! Grounded on the teacher's `audio/output.rs`: device selection,
//! preferred-config negotiation, and per-sample-format stream builders.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use tracing::{debug, info, warn};

use crate::error::DriverError;
use crate::playback::callback::{ControlCode, PlaybackCallback};

pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
}

impl AudioOutput {
    pub fn list_devices() -> Result<Vec<String>, DriverError> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| DriverError::StreamBuild { reason: format!("enumerate devices: {e}") })?
            .filter_map(|d| d.name().ok())
            .collect();
        Ok(devices)
    }

    /// Open `device_name` (or the host default) and negotiate a config:
    /// stereo, `requested_rate` (or the device's own default) if
    /// supported, else the device's default config entirely.
    pub fn open(device_name: Option<&str>, requested_rate: Option<u32>) -> Result<Self, DriverError> {
        let host = cpal::default_host();

        let device = match device_name {
            Some(name) => host
                .output_devices()
                .map_err(|e| DriverError::StreamBuild { reason: format!("enumerate devices: {e}") })?
                .find(|d| d.name().ok().as_deref() == Some(name))
                .ok_or_else(|| DriverError::DeviceNotFound { name: name.to_string() })?,
            None => host.default_output_device().ok_or(DriverError::NoDevice)?,
        };

        info!(device = %device.name().unwrap_or_else(|_| "unknown".into()), "opening audio device");

        let (config, sample_format) = Self::negotiate_config(&device, requested_rate)?;
        debug!(rate = config.sample_rate.0, channels = config.channels, format = ?sample_format, "negotiated output config");

        Ok(AudioOutput { device, config, sample_format, stream: None })
    }

    fn negotiate_config(device: &Device, requested_rate: Option<u32>) -> Result<(StreamConfig, SampleFormat), DriverError> {
        let target_rate = requested_rate.unwrap_or(48_000);

        let mut supported = device
            .supported_output_configs()
            .map_err(|e| DriverError::StreamBuild { reason: format!("query configs: {e}") })?;

        let preferred = supported.find(|c| {
            c.channels() == 2
                && c.min_sample_rate().0 <= target_rate
                && c.max_sample_rate().0 >= target_rate
                && c.sample_format() == SampleFormat::F32
        });

        if let Some(supported) = preferred {
            let sample_format = supported.sample_format();
            let config = supported.with_sample_rate(cpal::SampleRate(target_rate)).config();
            return Ok((config, sample_format));
        }

        let default = device
            .default_output_config()
            .map_err(|e| DriverError::StreamBuild { reason: format!("default config: {e}") })?;
        Ok((default.config(), default.sample_format()))
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start the stream, pulling frames from `callback` on the driver's
    /// real-time thread (spec section 4.12). A [`ControlCode::Stop`]
    /// from the callback only silences further output for the remainder
    /// of this invocation; the stream itself is torn down by dropping
    /// the returned [`AudioOutput`].
    pub fn start(&mut self, callback: PlaybackCallback) -> Result<(), DriverError> {
        let channels = self.config.channels as usize;
        debug_assert_eq!(channels, 2, "drum player output is stereo-only");

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream_f32(callback)?,
            SampleFormat::I16 => self.build_stream_i16(callback)?,
            other => {
                return Err(DriverError::StreamBuild { reason: format!("unsupported sample format {other:?}") });
            }
        };

        stream.play().map_err(|e| DriverError::StreamStart { reason: e.to_string() })?;
        self.stream = Some(stream);
        info!("audio stream started");
        Ok(())
    }

    fn build_stream_f32(&self, mut callback: PlaybackCallback) -> Result<Stream, DriverError> {
        let mut scratch = Vec::new();
        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    scratch.resize(data.len(), 0.0);
                    if callback.fill(&mut scratch) == ControlCode::Stop {
                        scratch.iter_mut().for_each(|s| *s = 0.0);
                    }
                    for (dst, src) in data.iter_mut().zip(scratch.iter()) {
                        *dst = (*src as f32).clamp(-1.0, 1.0);
                    }
                },
                |err| warn!(error = %err, "audio stream error"),
                None,
            )
            .map_err(|e| DriverError::StreamBuild { reason: e.to_string() })
    }

    fn build_stream_i16(&self, mut callback: PlaybackCallback) -> Result<Stream, DriverError> {
        let mut scratch = Vec::new();
        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    scratch.resize(data.len(), 0.0);
                    if callback.fill(&mut scratch) == ControlCode::Stop {
                        scratch.iter_mut().for_each(|s| *s = 0.0);
                    }
                    for (dst, src) in data.iter_mut().zip(scratch.iter()) {
                        *dst = (src.clamp(-1.0, 1.0) * i16::MAX as f64) as i16;
                    }
                },
                |err| warn!(error = %err, "audio stream error"),
                None,
            )
            .map_err(|e| DriverError::StreamBuild { reason: e.to_string() })
    }

    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
        }
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stop();
    }
}
