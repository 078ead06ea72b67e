// Chord label and configuration error types

use crate::error::ErrorCode;
use log::error;
use thiserror::Error;

/// Chord error code constants
///
/// Error code range: 1001-1004
pub struct ChordErrorCodes {}

impl ChordErrorCodes {
    /// Chord label was empty or whitespace
    pub const EMPTY_LABEL: i32 = 1001;

    /// Leading root name is not one of the twelve pitch classes
    pub const UNKNOWN_ROOT: i32 = 1002;

    /// Suffix after the root does not name a known chord quality
    pub const UNKNOWN_QUALITY: i32 = 1003;

    /// A configuration constant is out of range
    pub const INVALID_CONFIG: i32 = 1004;
}

/// Log a chord error with structured context
pub fn log_chord_error(err: &ChordError, context: &str) {
    error!(
        "Chord error in {}: code={}, component=ChordVocabulary, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised when parsing chord labels or validating engine constants
///
/// Classification never produces these: degenerate or ambiguous chroma
/// resolves to "no chord" instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChordError {
    /// Chord label was empty
    #[error("chord label is empty")]
    EmptyLabel,

    /// Root note could not be parsed
    #[error("unknown root note in chord label '{label}'")]
    UnknownRoot { label: String },

    /// Quality suffix is not in the chord vocabulary
    #[error("unknown chord quality '{suffix}' in chord label '{label}'")]
    UnknownQuality { label: String, suffix: String },

    /// Configuration value is out of range
    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig { field: String, reason: String },
}

impl ErrorCode for ChordError {
    fn code(&self) -> i32 {
        match self {
            ChordError::EmptyLabel => ChordErrorCodes::EMPTY_LABEL,
            ChordError::UnknownRoot { .. } => ChordErrorCodes::UNKNOWN_ROOT,
            ChordError::UnknownQuality { .. } => ChordErrorCodes::UNKNOWN_QUALITY,
            ChordError::InvalidConfig { .. } => ChordErrorCodes::INVALID_CONFIG,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}
