// Analysis module - chord recognition pipeline
//
// This module holds the synchronous, per-frame part of the engine:
//
// - ChordClassifier: chroma frame -> chord label + confidence, or none
// - TemporalStabilizer: per-frame labels -> sparse, deduplicated timeline
// - Note expander: chord label -> notes for keyboard display
// - ChordPipeline: classifier + stabilizer + timeline writer for one session
//
// Nothing in here blocks or yields; the session worker in `engine` drives it.

use std::sync::Arc;

use tokio::sync::broadcast;

pub mod chroma;
pub mod classifier;
pub mod expander;
pub mod pitch;
pub mod stabilizer;
pub mod templates;
pub mod timeline;
pub mod types;

pub use chroma::{ChromaSample, ChromaVector};
pub use classifier::ChordClassifier;
pub use expander::{expand, expand_label, NoteSet};
pub use pitch::PitchClass;
pub use stabilizer::TemporalStabilizer;
pub use templates::{ChordLabel, ChordTemplate, CHORD_TEMPLATES};
pub use timeline::{ChordTimeline, TimelineWriter};
pub use types::{ChordOrigin, Classification, DetectedChord};

use crate::config::AppConfig;
use crate::error::{log_frame_error, FrameError};
use crate::telemetry::PipelineCounters;

/// Classifier, stabilizer and timeline writer for one listening session
///
/// The pipeline owns the session's only [`TimelineWriter`]. Frames must be
/// fed in arrival order.
pub struct ChordPipeline {
    classifier: ChordClassifier,
    stabilizer: TemporalStabilizer,
    writer: TimelineWriter,
    counters: Arc<PipelineCounters>,
    events_tx: Option<broadcast::Sender<DetectedChord>>,
}

impl ChordPipeline {
    pub fn new(config: &AppConfig, writer: TimelineWriter) -> Self {
        Self {
            classifier: ChordClassifier::new(config.classifier.clone()),
            stabilizer: TemporalStabilizer::new(&config.stabilizer),
            writer,
            counters: Arc::new(PipelineCounters::new()),
            events_tx: None,
        }
    }

    /// Publish every appended entry on `tx` as well
    pub fn with_events(mut self, tx: broadcast::Sender<DetectedChord>) -> Self {
        self.events_tx = Some(tx);
        self
    }

    /// Share counters with a session handle
    pub fn with_counters(mut self, counters: Arc<PipelineCounters>) -> Self {
        self.counters = counters;
        self
    }

    pub fn counters(&self) -> &Arc<PipelineCounters> {
        &self.counters
    }

    pub fn timeline(&self) -> ChordTimeline {
        self.writer.reader()
    }

    /// Process one chroma frame
    ///
    /// # Returns
    /// The entry appended to the timeline, if this frame produced one.
    /// Invalid frames are logged and skipped; they never end the session.
    pub fn process(&mut self, sample: &ChromaSample) -> Option<DetectedChord> {
        self.counters.record_frame();

        if let Err(err) = sample.validate() {
            self.skip_frame(&err);
            return None;
        }

        let classification = self.classifier.classify(&sample.chroma, sample.rms);
        let Some(chord) = classification.chord else {
            self.counters.record_without_chord();
            return None;
        };

        let candidate =
            DetectedChord::detected(chord, sample.timestamp_secs, classification.confidence);
        if !self.stabilizer.accepts(&candidate) {
            return None;
        }
        self.emit(candidate)
    }

    /// Record a frame the source failed to produce
    pub fn record_fault(&mut self, err: &FrameError) {
        self.counters.record_frame();
        self.skip_frame(err);
    }

    fn skip_frame(&self, err: &FrameError) {
        log_frame_error(err, "ChordPipeline::process");
        self.counters.record_skipped();
    }

    fn emit(&mut self, entry: DetectedChord) -> Option<DetectedChord> {
        // The stabilizer only remembers entries the timeline actually kept
        if !self.writer.append(entry) {
            return None;
        }
        self.stabilizer.commit(entry);
        self.counters.record_emitted();
        tracing::debug!(
            "[ChordPipeline] {} at {:.2}s (confidence {:.2})",
            entry.chord,
            entry.timestamp,
            entry.confidence
        );
        if let Some(tx) = self.events_tx.as_ref() {
            let _ = tx.send(entry);
        }
        Some(entry)
    }

    /// Forget stabilizer state; the timeline itself stays append-only
    pub fn reset(&mut self) {
        self.stabilizer.reset();
    }
}

#[cfg(test)]
mod tests;
