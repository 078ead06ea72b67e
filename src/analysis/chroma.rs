//! Chroma vectors and the inbound chroma sample contract.
//!
//! A chroma vector holds one energy per pitch class at a single analysis
//! instant. Only relative magnitudes matter; the units are whatever the
//! upstream feature extractor produces.

use serde::{Deserialize, Serialize};

use crate::analysis::pitch::{PitchClass, PITCH_CLASS_COUNT};
use crate::error::FrameError;

/// Relative level of non-root notes in [`ChromaVector::from_notes`]
const CHORD_TONE_LEVEL: f32 = 0.8;

/// Twelve non-negative pitch-class energies
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 12]", into = "[f32; 12]")]
pub struct ChromaVector([f32; PITCH_CLASS_COUNT]);

impl ChromaVector {
    /// Build a chroma vector, clamping negative and non-finite energies to 0
    pub fn new(bins: [f32; PITCH_CLASS_COUNT]) -> Self {
        Self(bins.map(|energy| if energy.is_finite() && energy > 0.0 { energy } else { 0.0 }))
    }

    pub fn zeros() -> Self {
        Self([0.0; PITCH_CLASS_COUNT])
    }

    /// Every bin set to the same energy
    pub fn flat(energy: f32) -> Self {
        Self::new([energy; PITCH_CLASS_COUNT])
    }

    /// Synthesize a chroma with peaks at exactly the given notes
    ///
    /// The first note is treated as the root and gets full level; the
    /// remaining notes get a slightly lower level so the root is the unique
    /// maximum. All other bins are zero.
    pub fn from_notes(notes: &[PitchClass]) -> Self {
        let mut bins = [0.0f32; PITCH_CLASS_COUNT];
        for (position, note) in notes.iter().enumerate() {
            let level = if position == 0 { 1.0 } else { CHORD_TONE_LEVEL };
            let bin = &mut bins[note.index()];
            *bin = bin.max(level);
        }
        Self(bins)
    }

    pub fn bins(&self) -> &[f32; PITCH_CLASS_COUNT] {
        &self.0
    }

    pub fn energy(&self, pitch: PitchClass) -> f32 {
        self.0[pitch.index()]
    }

    /// Strongest bin as (pitch class, energy); ties resolve to the lowest index
    pub fn argmax(&self) -> (PitchClass, f32) {
        let mut best_index = 0;
        let mut best_energy = self.0[0];
        for (index, &energy) in self.0.iter().enumerate().skip(1) {
            if energy > best_energy {
                best_index = index;
                best_energy = energy;
            }
        }
        (PitchClass::from_index(best_index), best_energy)
    }

    pub fn max(&self) -> f32 {
        self.argmax().1
    }

    pub fn total(&self) -> f32 {
        self.0.iter().sum()
    }

    /// Pitch classes whose energy is strictly above `threshold`
    pub fn peaks_above(&self, threshold: f32) -> impl Iterator<Item = PitchClass> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter(move |&(_, &energy)| energy > threshold)
            .map(|(index, _)| PitchClass::from_index(index))
    }
}

impl From<[f32; PITCH_CLASS_COUNT]> for ChromaVector {
    fn from(bins: [f32; PITCH_CLASS_COUNT]) -> Self {
        Self::new(bins)
    }
}

impl From<ChromaVector> for [f32; PITCH_CLASS_COUNT] {
    fn from(chroma: ChromaVector) -> Self {
        chroma.0
    }
}

/// One frame delivered by a chroma source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChromaSample {
    pub chroma: ChromaVector,
    /// Overall frame energy used by the silence gate
    pub rms: f32,
    /// Seconds since the start of the session
    pub timestamp_secs: f64,
}

impl ChromaSample {
    pub fn new(chroma: impl Into<ChromaVector>, rms: f32, timestamp_secs: f64) -> Self {
        Self {
            chroma: chroma.into(),
            rms,
            timestamp_secs,
        }
    }

    /// Check the fields the chroma vector cannot sanitize on its own
    pub fn validate(&self) -> Result<(), FrameError> {
        if !self.rms.is_finite() || self.rms < 0.0 {
            return Err(FrameError::InvalidSample {
                reason: format!("rms must be a non-negative number (got {})", self.rms),
            });
        }
        if !self.timestamp_secs.is_finite() || self.timestamp_secs < 0.0 {
            return Err(FrameError::InvalidSample {
                reason: format!(
                    "timestamp must be a non-negative number of seconds (got {})",
                    self.timestamp_secs
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sanitizes_bins() {
        let mut bins = [1.0; 12];
        bins[3] = -2.0;
        bins[5] = f32::NAN;
        bins[7] = f32::INFINITY;
        let chroma = ChromaVector::new(bins);
        assert_eq!(chroma.bins()[3], 0.0);
        assert_eq!(chroma.bins()[5], 0.0);
        assert_eq!(chroma.bins()[7], 0.0);
        assert_eq!(chroma.total(), 9.0);
    }

    #[test]
    fn test_argmax_ties_resolve_to_lowest_index() {
        let mut bins = [0.0; 12];
        bins[4] = 0.9;
        bins[9] = 0.9;
        let (root, energy) = ChromaVector::new(bins).argmax();
        assert_eq!(root.index(), 4);
        assert_eq!(energy, 0.9);

        let (root, _) = ChromaVector::flat(0.3).argmax();
        assert_eq!(root.index(), 0);
    }

    #[test]
    fn test_from_notes_emphasizes_root() {
        let notes = [PitchClass::new(9), PitchClass::new(0), PitchClass::new(4)];
        let chroma = ChromaVector::from_notes(&notes);
        assert_eq!(chroma.argmax().0, PitchClass::new(9));
        assert_eq!(chroma.peaks_above(0.5).count(), 3);
        assert_eq!(chroma.energy(PitchClass::new(2)), 0.0);
    }

    #[test]
    fn test_sample_validation() {
        let sample = ChromaSample::new([0.0; 12], 0.2, 1.5);
        assert!(sample.validate().is_ok());

        let sample = ChromaSample::new([0.0; 12], f32::NAN, 1.5);
        assert!(matches!(
            sample.validate(),
            Err(FrameError::InvalidSample { .. })
        ));

        let sample = ChromaSample::new([0.0; 12], 0.2, -1.0);
        assert!(sample.validate().is_err());
    }

    #[test]
    fn test_sample_json_shape() {
        let json = r#"{"chroma":[1,0,0,0,1,0,0,1,0,0,0,0],"rms":0.2,"timestamp_secs":0.5}"#;
        let sample: ChromaSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.chroma.energy(PitchClass::new(7)), 1.0);
        assert_eq!(sample.timestamp_secs, 0.5);
    }
}
