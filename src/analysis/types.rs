use serde::{Deserialize, Serialize};

use crate::analysis::templates::ChordLabel;

/// Result of classifying a single chroma frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Recognized chord, or `None` for silence / no confident match
    pub chord: Option<ChordLabel>,
    /// Confidence score (0.0-1.0); always 0.0 when `chord` is `None`
    pub confidence: f32,
}

impl Classification {
    pub fn none() -> Self {
        Self {
            chord: None,
            confidence: 0.0,
        }
    }

    pub fn chord(chord: ChordLabel, confidence: f32) -> Self {
        Self {
            chord: Some(chord),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    pub fn is_none(&self) -> bool {
        self.chord.is_none()
    }
}

/// Where a detected chord came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordOrigin {
    /// Classified from real chroma input
    Detected,
    /// Produced by the fallback progression generator; not a measurement
    Simulated,
}

/// One entry of the chord timeline
///
/// Immutable once emitted. Timelines are ordered by non-decreasing timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectedChord {
    pub chord: ChordLabel,
    /// Seconds since session start
    pub timestamp: f64,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    pub origin: ChordOrigin,
}

impl DetectedChord {
    pub fn detected(chord: ChordLabel, timestamp: f64, confidence: f32) -> Self {
        Self {
            chord,
            timestamp,
            confidence: confidence.clamp(0.0, 1.0),
            origin: ChordOrigin::Detected,
        }
    }

    pub fn simulated(chord: ChordLabel, timestamp: f64, confidence: f32) -> Self {
        Self {
            chord,
            timestamp,
            confidence: confidence.clamp(0.0, 1.0),
            origin: ChordOrigin::Simulated,
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.origin == ChordOrigin::Simulated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_has_zero_confidence() {
        let none = Classification::none();
        assert!(none.is_none());
        assert_eq!(none.confidence, 0.0);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let label: ChordLabel = "C".parse().unwrap();
        assert_eq!(Classification::chord(label, 1.7).confidence, 1.0);
        assert_eq!(DetectedChord::detected(label, 0.0, -0.2).confidence, 0.0);
    }

    #[test]
    fn test_detected_chord_json_shape() {
        let label: ChordLabel = "Em".parse().unwrap();
        let chord = DetectedChord::simulated(label, 4.0, 0.8);
        let json = serde_json::to_value(chord).unwrap();
        assert_eq!(json["chord"], "Em");
        assert_eq!(json["origin"], "simulated");
        assert_eq!(json["timestamp"], 4.0);
    }
}
