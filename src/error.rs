//! Error types for the drum player.
//!
//! Expected errors use `Result<T, E>` with meaningful enums, grouped by
//! subsystem the way spec section 7 describes: font errors, I/O errors,
//! and a generic escape hatch for setup-time glue code.

use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum DfxError {
    /// IO errors from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Font lexing/parsing/schema errors.
    #[error("font error: {0}")]
    Font(#[from] FontError),

    /// Sound-file I/O or format errors.
    #[error("sound file error: {0}")]
    SoundFile(#[from] SoundFileError),

    /// Kit-build errors (path resolution, layer sort, note-map conflicts).
    #[error("kit build error: {0}")]
    KitBuild(#[from] KitBuildError),

    /// Audio driver errors (device open/start failures).
    #[error("audio driver error: {0}")]
    Driver(#[from] DriverError),

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic errors from glue code.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Errors from the Font Lexer, Parser, and Validator (spec section 4.5-4.7).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FontError {
    /// Lexer hit a character it can't classify.
    #[error("{row}:{col}: unexpected character {ch:?}")]
    UnexpectedChar { row: usize, col: usize, ch: char },

    /// A quoted string ran off the end of a line.
    #[error("{row}:{col}: unterminated string")]
    UnterminatedString { row: usize, col: usize },

    /// An escape sequence inside a quoted string isn't recognized.
    #[error("{row}:{col}: invalid escaped character {ch:?}")]
    InvalidEscapedChar { row: usize, col: usize, ch: char },

    /// `\uHHHH` escapes are reserved but not implemented.
    #[error("{row}:{col}: unicode escapes are not supported")]
    Unsupported { row: usize, col: usize },

    /// Ran out of tokens mid-grammar-rule.
    #[error("{row}:{col}: unexpected end of input")]
    UnexpectedEof { row: usize, col: usize },

    /// Parser expected one token kind and got another.
    #[error("{row}:{col}: expected {expected}, found {found}")]
    UnexpectedToken {
        row: usize,
        col: usize,
        expected: String,
        found: String,
    },

    /// A name-value pair appeared as the value of another name-value pair
    /// without intervening `{}`.
    #[error("{row}:{col}: name-value pair cannot be used as a bare value")]
    NestedNameValue { row: usize, col: usize },

    /// Validator: missing the `instruments` object in a kit.
    #[error("{path}: kit is missing required 'instruments' object")]
    InstrumentsMissing { path: String },

    /// Validator: an instrument has no `note` field.
    #[error("{path}: instrument is missing required 'note' field")]
    NoteMissing { path: String },

    /// Validator: `note` isn't a whole number in 0..=127.
    #[error("{path}: note {value} is out of range 0..=127")]
    NoteOutOfRange { path: String, value: f64 },

    /// Validator: velocity layer name isn't `v` followed by digits 0-127.
    #[error("{path}: {name:?} is not a valid velocity code name")]
    InvalidVelocityCode { path: String, name: String },

    /// Validator: two velocity layers in one drum share a nominal min-velocity.
    #[error("{path}: duplicate velocity code {code}")]
    DuplicateVelocityCode { path: String, code: u8 },

    /// Validator: velocity layer has no `robins` array, or it's empty.
    #[error("{path}: 'robins' must be a non-empty array")]
    RobinsMissing { path: String },

    /// Validator: a robin is missing its required `fname`.
    #[error("{path}: robin is missing required 'fname' string")]
    FnameMissing { path: String },

    /// Validator: `peak`/`rms` must be `0 < x <= 1` after unit conversion.
    #[error("{path}: value {value} is out of range (0, 1]")]
    RatioOutOfRange { path: String, value: f64 },

    /// Validator: a numeric-looking field has the wrong shape entirely.
    #[error("{path}: expected a number, found {found}")]
    ExpectedNumber { path: String, found: String },

    /// Validator: an `include` file couldn't be resolved or parsed.
    #[error("{path}: failed to load included file {file:?}: {reason}")]
    IncludeFailed {
        path: String,
        file: String,
        reason: String,
    },

    /// Engineering-notation number literal failed to parse.
    #[error("{row}:{col}: invalid number literal: {reason}")]
    InvalidNumber { row: usize, col: usize, reason: String },
}

/// Errors from the Sound-File Reader (spec section 4.2).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SoundFileError {
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("unsupported format in {path}: {reason}")]
    UnsupportedFormat { path: String, reason: String },

    #[error("short read in {path}: wanted {wanted} bytes, got {got}")]
    ReadShort { path: String, wanted: usize, got: usize },

    #[error("seek failed in {path}")]
    SeekFailed { path: String },

    #[error("{path} is empty")]
    EmptyFile { path: String },
}

/// Errors from the Kit Builder (spec section 4.8).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum KitBuildError {
    #[error("note {note} is claimed by both {first:?} and {second:?}")]
    DuplicateNoteMapping {
        note: u8,
        first: String,
        second: String,
    },

    #[error("failed to load {count} robin(s); see sound file errors")]
    RobinLoadFailures { count: usize },
}

/// Errors opening or running the audio driver.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("no output device available")]
    NoDevice,

    #[error("device {name:?} not found")]
    DeviceNotFound { name: String },

    #[error("failed to build output stream: {reason}")]
    StreamBuild { reason: String },

    #[error("failed to start output stream: {reason}")]
    StreamStart { reason: String },
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DfxError>;

impl DfxError {
    /// A short, stable code suitable for logs and tests, mirroring the
    /// per-subsystem grouping from spec section 7.
    pub fn error_code(&self) -> &'static str {
        match self {
            DfxError::Io(_) => "DFX_IO_001",
            DfxError::Font(_) => "DFX_FONT_001",
            DfxError::SoundFile(_) => "DFX_SF_001",
            DfxError::KitBuild(_) => "DFX_KIT_001",
            DfxError::Driver(_) => "DFX_DRV_001",
            DfxError::Config(_) => "DFX_CFG_001",
            DfxError::Other(_) => "DFX_OTHER_001",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_error_renders_path_context() {
        let e = FontError::InvalidVelocityCode {
            path: "MyKit/snare/v128".into(),
            name: "v128".into(),
        };
        assert_eq!(
            e.to_string(),
            "MyKit/snare/v128: \"v128\" is not a valid velocity code name"
        );
    }

    #[test]
    fn error_codes_are_grouped_by_subsystem() {
        let font: DfxError = FontError::NoteMissing { path: "k/d".into() }.into();
        assert_eq!(font.error_code(), "DFX_FONT_001");
    }
}
