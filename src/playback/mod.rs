//! Real-time playback subsystem: MIDI decoding, the polyphonic voice
//! allocator, and the driver callback that ties them together (spec
//! sections 4.10-4.12).

pub mod callback;
pub mod midi;
pub mod poly_drummer;
pub mod voice_table;

pub use callback::{ControlCode, PlaybackCallback};
pub use midi::MidiMessage;
pub use poly_drummer::PolyDrummer;
pub use voice_table::VoiceTable;
