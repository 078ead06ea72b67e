// Chord Engine - real-time chord recognition
// Chroma frames in, a deduplicated chord timeline out

// Module declarations
pub mod analysis;
pub mod config;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod fixtures;
pub mod telemetry;

// Re-exports for convenience
pub use analysis::{
    expand, ChordClassifier, ChordLabel, ChordOrigin, ChordTimeline, ChromaSample, ChromaVector,
    Classification, DetectedChord, NoteSet, PitchClass, TemporalStabilizer,
};
pub use config::AppConfig;
pub use engine::{
    chroma_queue, chroma_queue_for, start_session, ChromaFeed, ChromaSource, SessionHandle,
    SessionMode,
};
pub use error::{ChordError, ErrorCode, FrameError, SessionError};
pub use fallback::{FallbackGenerator, GeneratorState, Progression};
