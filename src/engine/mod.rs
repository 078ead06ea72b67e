// Engine module - session drivers around the analysis pipeline
//
// - source: the ChromaSource seam plus the lock-free queue feed and replay
// - session: worker thread per session, SessionHandle with cancellation

pub mod session;
pub mod source;

pub use session::{start_session, SessionHandle, SessionMode};
pub use source::{
    chroma_queue, chroma_queue_for, ChromaFeed, ChromaSource, QueueChromaSource, ReplaySource,
};
