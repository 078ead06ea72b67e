//! Chord vocabulary - the single template table shared by classification
//! and note expansion, plus the `ChordLabel` type built on it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::analysis::pitch::PitchClass;
use crate::error::ChordError;

/// A chord quality: a name suffix and its intervals above the root
///
/// Intervals are distinct semitone offsets in 1..=11; the root itself is implied.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ChordTemplate {
    pub name: &'static str,
    pub intervals: &'static [u8],
}

/// The recognizable chord vocabulary, in match priority order.
///
/// Classification keeps the first template to reach the best score, so the
/// seventh chords are declared before the triads they contain. Otherwise a
/// dominant-7 frame would score 1.0 on the major triad first and never
/// resolve to "7".
pub static CHORD_TEMPLATES: [ChordTemplate; 9] = [
    ChordTemplate {
        name: "7",
        intervals: &[4, 7, 10],
    },
    ChordTemplate {
        name: "m7",
        intervals: &[3, 7, 10],
    },
    ChordTemplate {
        name: "maj7",
        intervals: &[4, 7, 11],
    },
    ChordTemplate {
        name: "",
        intervals: &[4, 7],
    },
    ChordTemplate {
        name: "m",
        intervals: &[3, 7],
    },
    ChordTemplate {
        name: "dim",
        intervals: &[3, 6],
    },
    ChordTemplate {
        name: "aug",
        intervals: &[4, 8],
    },
    ChordTemplate {
        name: "sus2",
        intervals: &[2, 7],
    },
    ChordTemplate {
        name: "sus4",
        intervals: &[5, 7],
    },
];

/// Index of the major triad in [`CHORD_TEMPLATES`]
const MAJOR_INDEX: usize = 3;

impl ChordTemplate {
    /// The major triad, used as the expansion fallback
    pub fn major() -> &'static ChordTemplate {
        &CHORD_TEMPLATES[MAJOR_INDEX]
    }

    /// Look up a template by its exact name suffix
    pub fn by_name(name: &str) -> Option<&'static ChordTemplate> {
        CHORD_TEMPLATES.iter().find(|template| template.name == name)
    }

    pub fn interval_set(&self) -> IntervalSet {
        self.intervals.iter().copied().collect()
    }

    /// Fraction of this template's intervals present in `observed`
    pub fn score(&self, observed: IntervalSet) -> f32 {
        let matched = self.interval_set().intersection(observed).len();
        matched as f32 / self.intervals.len() as f32
    }

    /// Pitch classes of this chord built on `root`, root first
    pub fn notes(&self, root: PitchClass) -> Vec<PitchClass> {
        std::iter::once(root)
            .chain(
                self.intervals
                    .iter()
                    .map(|&semitones| root.transpose(semitones as i32)),
            )
            .collect()
    }
}

/// Set of semitone intervals above a root (bit `i` = interval `i`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntervalSet(u16);

impl IntervalSet {
    pub fn insert(&mut self, semitones: u8) {
        self.0 |= 1 << (semitones % 12);
    }

    pub fn contains(self, semitones: u8) -> bool {
        self.0 & (1 << (semitones % 12)) != 0
    }

    pub fn intersection(self, other: IntervalSet) -> IntervalSet {
        IntervalSet(self.0 & other.0)
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<u8> for IntervalSet {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        let mut set = IntervalSet::default();
        for semitones in iter {
            set.insert(semitones);
        }
        set
    }
}

/// A chord name: root pitch class plus chord quality ("C", "Am", "G7")
///
/// Serialized as its string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChordLabel {
    root: PitchClass,
    template: &'static ChordTemplate,
}

impl ChordLabel {
    pub fn new(root: PitchClass, template: &'static ChordTemplate) -> Self {
        Self { root, template }
    }

    pub fn root(&self) -> PitchClass {
        self.root
    }

    pub fn template(&self) -> &'static ChordTemplate {
        self.template
    }

    /// Quality suffix ("" for major)
    pub fn quality(&self) -> &'static str {
        self.template.name
    }

    pub fn notes(&self) -> Vec<PitchClass> {
        self.template.notes(self.root)
    }
}

impl fmt::Display for ChordLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.root.name(), self.template.name)
    }
}

impl FromStr for ChordLabel {
    type Err = ChordError;

    /// Strict parse: unknown roots and suffixes are errors
    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ChordError::EmptyLabel);
        }

        let (root, suffix) =
            PitchClass::split_label(label).ok_or_else(|| ChordError::UnknownRoot {
                label: label.to_string(),
            })?;
        let template = ChordTemplate::by_name(suffix).ok_or_else(|| ChordError::UnknownQuality {
            label: label.to_string(),
            suffix: suffix.to_string(),
        })?;

        Ok(Self::new(root, template))
    }
}

impl PartialEq<str> for ChordLabel {
    fn eq(&self, other: &str) -> bool {
        other.parse::<ChordLabel>().map(|label| label == *self).unwrap_or(false)
    }
}

impl PartialEq<&str> for ChordLabel {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl Serialize for ChordLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ChordLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_table_is_well_formed() {
        for template in CHORD_TEMPLATES.iter() {
            let set = template.interval_set();
            assert_eq!(
                set.len(),
                template.intervals.len(),
                "intervals of '{}' must be distinct",
                template.name
            );
            assert!(
                template.intervals.iter().all(|&i| (1..=11).contains(&i)),
                "intervals of '{}' must be in 1..=11",
                template.name
            );
        }

        let mut names: Vec<&str> = CHORD_TEMPLATES.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CHORD_TEMPLATES.len(), "names must be unique");
    }

    #[test]
    fn test_major_is_empty_suffix() {
        assert_eq!(ChordTemplate::major().name, "");
        assert_eq!(ChordTemplate::major().intervals, &[4, 7]);
    }

    #[test]
    fn test_score_counts_template_coverage() {
        let dom7 = ChordTemplate::by_name("7").unwrap();
        let observed: IntervalSet = [4, 7].into_iter().collect();
        assert!((dom7.score(observed) - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(ChordTemplate::major().score(observed), 1.0);
        assert_eq!(ChordTemplate::by_name("sus2").unwrap().score(observed), 0.5);
    }

    #[test]
    fn test_label_parse_and_display() {
        let label: ChordLabel = "F#m7".parse().unwrap();
        assert_eq!(label.root(), PitchClass::new(6));
        assert_eq!(label.quality(), "m7");
        assert_eq!(label.to_string(), "F#m7");

        let label: ChordLabel = "Bb".parse().unwrap();
        assert_eq!(label.to_string(), "A#");
        assert_eq!(label, "A#");
    }

    #[test]
    fn test_label_parse_errors() {
        assert_eq!("".parse::<ChordLabel>(), Err(ChordError::EmptyLabel));
        assert!(matches!(
            "Hm".parse::<ChordLabel>(),
            Err(ChordError::UnknownRoot { .. })
        ));
        assert!(matches!(
            "Cadd9".parse::<ChordLabel>(),
            Err(ChordError::UnknownQuality { ref suffix, .. }) if suffix == "add9"
        ));
    }

    #[test]
    fn test_label_serde_as_string() {
        let label: ChordLabel = "Am".parse().unwrap();
        assert_eq!(serde_json::to_string(&label).unwrap(), "\"Am\"");
        let parsed: ChordLabel = serde_json::from_str("\"Gmaj7\"").unwrap();
        assert_eq!(parsed.to_string(), "Gmaj7");
        assert!(serde_json::from_str::<ChordLabel>("\"Gadd9\"").is_err());
    }

    #[test]
    fn test_notes_for_label() {
        let label: ChordLabel = "G7".parse().unwrap();
        let names: Vec<&str> = label.notes().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["G", "B", "D", "F"]);
    }
}
