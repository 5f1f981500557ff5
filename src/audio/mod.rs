//! Real-time audio subsystem: sample storage and playback cursors (spec
//! sections 4.2-4.4), sound file decoding, and the `cpal` output driver.

pub mod buffer;
pub mod output;
pub mod soundfile;
pub mod wave;

pub use buffer::{Channels, SampleBuffer, StereoFrame};
pub use soundfile::SoundFile;
pub use wave::InMemoryWave;
