// Session lifecycle and per-frame fault error types

use crate::error::ErrorCode;
use log::{error, warn};
use thiserror::Error;

/// Session error code constants
///
/// Error code range: 2001-2004
pub struct SessionErrorCodes {}

impl SessionErrorCodes {
    /// Worker thread could not be spawned
    pub const SPAWN_FAILED: i32 = 2001;

    /// Session was already cancelled
    pub const ALREADY_CANCELLED: i32 = 2002;

    /// Worker thread panicked before it could be joined
    pub const WORKER_PANICKED: i32 = 2003;

    /// Mutex/RwLock was poisoned
    pub const LOCK_POISONED: i32 = 2004;
}

/// Frame error code constants
///
/// Error code range: 3001-3003
pub struct FrameErrorCodes {}

impl FrameErrorCodes {
    /// Sample carried non-finite or malformed values
    pub const INVALID_SAMPLE: i32 = 3001;

    /// The chroma source failed to produce this frame
    pub const SOURCE_FAULT: i32 = 3002;

    /// The push queue was full and the frame was dropped
    pub const QUEUE_FULL: i32 = 3003;
}

/// Log a session error with structured context
pub fn log_session_error(err: &SessionError, context: &str) {
    error!(
        "Session error in {}: code={}, component=ChordSession, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Log a skipped frame
///
/// Frame faults are recovered locally, so they are logged at warn level.
pub fn log_frame_error(err: &FrameError, context: &str) {
    warn!(
        "Frame skipped in {}: code={}, component=ChromaSource, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Session lifecycle errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Worker thread could not be spawned
    #[error("failed to spawn session worker: {reason}")]
    SpawnFailed { reason: String },

    /// Session was already cancelled
    #[error("session already cancelled")]
    AlreadyCancelled,

    /// Worker thread panicked
    #[error("session worker panicked")]
    WorkerPanicked,

    /// Mutex/RwLock was poisoned
    #[error("lock poisoned on {component}")]
    LockPoisoned { component: String },
}

impl ErrorCode for SessionError {
    fn code(&self) -> i32 {
        match self {
            SessionError::SpawnFailed { .. } => SessionErrorCodes::SPAWN_FAILED,
            SessionError::AlreadyCancelled => SessionErrorCodes::ALREADY_CANCELLED,
            SessionError::WorkerPanicked => SessionErrorCodes::WORKER_PANICKED,
            SessionError::LockPoisoned { .. } => SessionErrorCodes::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::SpawnFailed {
            reason: err.to_string(),
        }
    }
}

/// Per-frame faults
///
/// A frame fault never ends a session: the frame is skipped and the
/// worker moves on to the next one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    /// Sample values are unusable
    #[error("invalid chroma sample: {reason}")]
    InvalidSample { reason: String },

    /// Source failed to compute this frame
    #[error("chroma source fault: {details}")]
    SourceFault { details: String },

    /// Queue full, frame dropped by the producer
    #[error("chroma queue full, frame dropped")]
    QueueFull,
}

impl ErrorCode for FrameError {
    fn code(&self) -> i32 {
        match self {
            FrameError::InvalidSample { .. } => FrameErrorCodes::INVALID_SAMPLE,
            FrameError::SourceFault { .. } => FrameErrorCodes::SOURCE_FAULT,
            FrameError::QueueFull => FrameErrorCodes::QUEUE_FULL,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}
