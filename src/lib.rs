//! # DFX Drum Player
//!
//! Real-time multi-layered drum sample player. Parses a drum-font ("Bryx" or
//! JSON dialect) describing a kit's velocity layers and round robins, loads
//! the referenced wave files into memory, and drives a polyphonic voice
//! allocator from incoming MIDI note-on events through a real-time stereo
//! mix callback.
//!
//! **Architecture:** font (lex/parse/validate) -> kit builder -> sample
//! buffers + in-memory wave cursors -> voice table -> poly drummer -> audio
//! driver callback.

pub mod audio;
pub mod config;
pub mod error;
pub mod font;
pub mod kit;
pub mod number;
pub mod playback;

pub use error::{DfxError, Result};
