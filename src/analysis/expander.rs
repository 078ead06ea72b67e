//! Note expansion - rebuilds the notes of a chord label for display.
//!
//! Expansion is lenient where parsing is strict: an unrecognized quality
//! suffix falls back to the major triad instead of failing, so a keyboard
//! view can always highlight something.

use serde::Serialize;

use crate::analysis::pitch::PitchClass;
use crate::analysis::templates::{ChordLabel, ChordTemplate};

/// Ordered note names of a chord, root first
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct NoteSet(Vec<&'static str>);

impl NoteSet {
    fn from_pitches(pitches: &[PitchClass]) -> Self {
        Self(pitches.iter().map(|pitch| pitch.name()).collect())
    }

    pub fn names(&self) -> &[&'static str] {
        &self.0
    }

    /// Root name, if the set is non-empty
    pub fn root(&self) -> Option<&'static str> {
        self.0.first().copied()
    }

    /// Pitch classes of the notes, root first
    pub fn pitch_classes(&self) -> Vec<PitchClass> {
        self.0
            .iter()
            .filter_map(|name| PitchClass::parse_name(name))
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|note| *note == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq<[&str]> for NoteSet {
    fn eq(&self, other: &[&str]) -> bool {
        self.0.as_slice() == other
    }
}

impl<const N: usize> PartialEq<[&str; N]> for NoteSet {
    fn eq(&self, other: &[&str; N]) -> bool {
        self.0.as_slice() == other.as_slice()
    }
}

/// Expand a chord label string into its notes
///
/// The label is split into a root (letter plus optional `#`/`b`) and a
/// quality suffix. An unknown suffix expands as a major triad. A label
/// without a recognizable root expands to an empty set.
pub fn expand(label: &str) -> NoteSet {
    let label = label.trim();
    let Some((root, suffix)) = PitchClass::split_label(label) else {
        tracing::debug!("[NoteExpander] No root in chord label '{}'", label);
        return NoteSet::default();
    };

    let template = ChordTemplate::by_name(suffix).unwrap_or_else(|| {
        tracing::debug!(
            "[NoteExpander] Unknown quality '{}' in '{}', expanding as major",
            suffix,
            label
        );
        ChordTemplate::major()
    });

    NoteSet::from_pitches(&template.notes(root))
}

/// Expand an already-parsed chord label
pub fn expand_label(label: &ChordLabel) -> NoteSet {
    NoteSet::from_pitches(&label.notes())
}
