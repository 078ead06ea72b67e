// ChordClassifier - template-matching chord recognition from chroma
//
// This module turns one chroma frame into a chord label and confidence, or
// "no chord". Steps:
//
// 1. Energy gate: frames quieter than the configured gate are silence
// 2. Root: strongest chroma bin (lowest index wins ties)
// 3. Peaks: bins strictly above `max * peak_ratio` are the active notes
// 4. Intervals: active notes relative to the root
// 5. Templates: score = |template ∩ observed| / |template|, first-declared
//    template wins ties, scores below `min_match_score` are ignored
//
// Templates come from `templates.rs`, the table the note expander reads.

use crate::analysis::chroma::ChromaVector;
use crate::analysis::pitch::PITCH_CLASS_COUNT;
use crate::analysis::templates::{ChordLabel, ChordTemplate, IntervalSet, CHORD_TEMPLATES};
use crate::analysis::types::Classification;
use crate::config::ClassifierConfig;

/// Chord classifier with immutable calibration constants
///
/// `classify` is a pure function of its inputs and the configuration.
#[derive(Debug, Clone, Default)]
pub struct ChordClassifier {
    config: ClassifierConfig,
}

impl ChordClassifier {
    /// Create a new ChordClassifier
    ///
    /// # Arguments
    /// * `config` - Calibration constants (energy gate, peak ratio, match score)
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify a single chroma frame
    ///
    /// # Arguments
    /// * `chroma` - Pitch-class energies for the frame
    /// * `energy` - Overall frame energy (RMS) used by the silence gate
    ///
    /// # Returns
    /// The best matching chord and its confidence, or
    /// [`Classification::none`] for silence, degenerate or ambiguous input.
    /// Confidence is the match score scaled by the share of frame energy on
    /// the chord's own tones; it measures concentration, not root dominance.
    pub fn classify(&self, chroma: &ChromaVector, energy: f32) -> Classification {
        if !energy.is_finite() || energy < self.config.energy_gate {
            return Classification::none();
        }

        let (root, max_energy) = chroma.argmax();
        if max_energy <= f32::EPSILON {
            return Classification::none();
        }

        let threshold = max_energy * self.config.peak_ratio;
        let mut observed = IntervalSet::default();
        let mut active_notes = 1;
        for pitch in chroma.peaks_above(threshold).filter(|&pitch| pitch != root) {
            observed.insert(pitch.interval_from(root));
            active_notes += 1;
        }

        if active_notes < self.config.min_active_notes {
            return Classification::none();
        }
        if active_notes > self.config.max_active_notes || active_notes >= PITCH_CLASS_COUNT {
            // Too much of the octave is lit up to name a tonal centre
            return Classification::none();
        }

        let Some((template, score)) = self.best_template(observed) else {
            return Classification::none();
        };

        let confidence = score * Self::chord_energy_ratio(chroma, ChordLabel::new(root, template));
        Classification::chord(ChordLabel::new(root, template), confidence)
    }

    /// Find the best-scoring template for an interval set
    ///
    /// Updates only on strictly greater scores, so ties keep the template
    /// declared first in [`CHORD_TEMPLATES`].
    fn best_template(&self, observed: IntervalSet) -> Option<(&'static ChordTemplate, f32)> {
        let mut best: Option<(&'static ChordTemplate, f32)> = None;
        for template in CHORD_TEMPLATES.iter() {
            let score = template.score(observed);
            if score < self.config.min_match_score {
                continue;
            }
            let improves = best.map(|(_, best_score)| score > best_score).unwrap_or(true);
            if improves {
                best = Some((template, score));
            }
        }
        best
    }

    /// Share of the frame's total energy that lies on the chord's notes
    fn chord_energy_ratio(chroma: &ChromaVector, label: ChordLabel) -> f32 {
        let total = chroma.total();
        if total <= f32::EPSILON {
            return 0.0;
        }
        let on_chord: f32 = label.notes().iter().map(|&pitch| chroma.energy(pitch)).sum();
        (on_chord / total).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
