//! TemporalStabilizer - turns per-frame classifications into a sparse timeline
//!
//! Consecutive frames usually repeat the same chord. The stabilizer appends an
//! entry only when the label changes, or when the same label is still sounding
//! more than the re-trigger interval after it was last appended. Frames with
//! no chord never produce an entry; silence shows up as a gap in timestamps.
//!
//! The only state is the last appended entry, so a stabilizer can be reset
//! between sessions at no cost.

use crate::analysis::types::{Classification, DetectedChord};
use crate::config::StabilizerConfig;

#[derive(Debug, Clone)]
pub struct TemporalStabilizer {
    retrigger_interval_secs: f64,
    last: Option<DetectedChord>,
}

impl TemporalStabilizer {
    pub fn new(config: &StabilizerConfig) -> Self {
        Self {
            retrigger_interval_secs: config.retrigger_interval_secs,
            last: None,
        }
    }

    /// Offer one classification taken at `timestamp_secs`
    ///
    /// # Returns
    /// `Some(entry)` if the caller should append `entry` to the timeline,
    /// `None` if the frame is silent, a duplicate within the re-trigger
    /// interval, or out of order.
    pub fn offer(
        &mut self,
        classification: &Classification,
        timestamp_secs: f64,
    ) -> Option<DetectedChord> {
        let chord = classification.chord?;
        self.offer_chord(DetectedChord::detected(
            chord,
            timestamp_secs,
            classification.confidence,
        ))
    }

    /// Offer an already-built candidate entry and record it if accepted
    pub fn offer_chord(&mut self, candidate: DetectedChord) -> Option<DetectedChord> {
        if !self.accepts(&candidate) {
            return None;
        }
        self.commit(candidate);
        Some(candidate)
    }

    /// Whether `candidate` should be appended, without recording it
    ///
    /// Pair with [`commit`](Self::commit) once the entry is actually stored.
    pub fn accepts(&self, candidate: &DetectedChord) -> bool {
        let Some(last) = self.last.as_ref() else {
            return true;
        };

        if candidate.timestamp < last.timestamp {
            tracing::warn!(
                "[Stabilizer] Dropping out-of-order frame at {:.3}s (last entry at {:.3}s)",
                candidate.timestamp,
                last.timestamp
            );
            return false;
        }

        candidate.chord != last.chord
            || candidate.timestamp - last.timestamp > self.retrigger_interval_secs
    }

    /// Record `entry` as the last appended entry
    pub fn commit(&mut self, entry: DetectedChord) {
        self.last = Some(entry);
    }

    /// The most recently appended entry
    pub fn last(&self) -> Option<&DetectedChord> {
        self.last.as_ref()
    }

    pub fn retrigger_interval_secs(&self) -> f64 {
        self.retrigger_interval_secs
    }

    /// Forget the last entry; the next chord is always appended
    pub fn reset(&mut self) {
        self.last = None;
    }
}

impl Default for TemporalStabilizer {
    fn default() -> Self {
        Self::new(&StabilizerConfig::default())
    }
}
