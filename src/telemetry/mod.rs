//! Pipeline counters for one chord session.
//!
//! The worker thread increments these lock-free; readers take a serializable
//! snapshot at any time without pausing the pipeline.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Lock-free counters shared between a session worker and its handle
#[derive(Debug, Default)]
pub struct PipelineCounters {
    frames_received: AtomicU64,
    frames_skipped: AtomicU64,
    frames_without_chord: AtomicU64,
    chords_emitted: AtomicU64,
    frames_dropped: AtomicU64,
}

/// Snapshot of [`PipelineCounters`] for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    /// Frames pulled from the source, including faulty ones
    pub frames_received: u64,
    /// Frames skipped because of a fault
    pub frames_skipped: u64,
    /// Frames classified as silence or no confident chord
    pub frames_without_chord: u64,
    /// Entries appended to the timeline
    pub chords_emitted: u64,
    /// Frames the producer could not enqueue
    pub frames_dropped: u64,
}

impl PipelineCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.frames_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_without_chord(&self) {
        self.frames_without_chord.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_emitted(&self) {
        self.chords_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            frames_without_chord: self.frames_without_chord.load(Ordering::Relaxed),
            chords_emitted: self.chords_emitted.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }
}
