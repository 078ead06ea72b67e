// Error types for the chord recognition engine
//
// This module defines typed errors for chord label parsing, session lifecycle
// and per-frame chroma faults. Each enum carries its own numeric code range.

mod chord;
mod session;

pub use chord::{log_chord_error, ChordError, ChordErrorCodes};
pub use session::{
    log_frame_error, log_session_error, FrameError, FrameErrorCodes, SessionError,
    SessionErrorCodes,
};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
