//! ChordTimeline - the append-only detected chord sequence of one session.
//!
//! There is exactly one writer per timeline. `TimelineWriter` is not `Clone`,
//! and the only way to get one is [`ChordTimeline::create`]. Readers hold
//! `ChordTimeline` clones that can only take snapshots; they must tolerate the
//! sequence growing between reads.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::analysis::types::DetectedChord;

/// Read-only handle to a chord timeline
#[derive(Debug, Clone)]
pub struct ChordTimeline {
    entries: Arc<RwLock<Vec<DetectedChord>>>,
}

/// The single write capability for a timeline
#[derive(Debug)]
pub struct TimelineWriter {
    entries: Arc<RwLock<Vec<DetectedChord>>>,
}

impl ChordTimeline {
    /// Create an empty timeline and its writer
    pub fn create() -> (TimelineWriter, ChordTimeline) {
        let entries = Arc::new(RwLock::new(Vec::new()));
        (
            TimelineWriter {
                entries: Arc::clone(&entries),
            },
            ChordTimeline { entries },
        )
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<DetectedChord>> {
        // Appends cannot leave the Vec half-written, so a poisoned lock is still readable
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of every entry appended so far
    pub fn snapshot(&self) -> Vec<DetectedChord> {
        self.read().clone()
    }

    /// Entries appended at or after position `from`
    ///
    /// Lets a polling reader fetch only what is new since its last read.
    pub fn since(&self, from: usize) -> Vec<DetectedChord> {
        self.read().iter().skip(from).copied().collect()
    }

    pub fn latest(&self) -> Option<DetectedChord> {
        self.read().last().copied()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl TimelineWriter {
    fn write(&self) -> RwLockWriteGuard<'_, Vec<DetectedChord>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            tracing::warn!("[ChordTimeline] Recovering poisoned timeline lock");
            poisoned.into_inner()
        })
    }

    /// Append an entry
    ///
    /// Entries must arrive in non-decreasing timestamp order; an entry older
    /// than the current tail is refused and `false` is returned.
    pub fn append(&mut self, entry: DetectedChord) -> bool {
        let mut entries = self.write();
        if let Some(last) = entries.last() {
            if entry.timestamp < last.timestamp {
                tracing::warn!(
                    "[ChordTimeline] Refusing entry at {:.3}s behind tail at {:.3}s",
                    entry.timestamp,
                    last.timestamp
                );
                return false;
            }
        }
        entries.push(entry);
        true
    }

    /// A reader for the timeline this writer appends to
    pub fn reader(&self) -> ChordTimeline {
        ChordTimeline {
            entries: Arc::clone(&self.entries),
        }
    }
}
