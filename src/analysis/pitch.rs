//! Pitch classes - the twelve equal-tempered note names, octave-free.

use std::fmt;

/// Number of pitch classes per octave
pub const PITCH_CLASS_COUNT: usize = 12;

/// Canonical pitch-class names, index = pitch class
pub const PITCH_NAMES: [&str; PITCH_CLASS_COUNT] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One of the twelve pitch classes (0 = C)
///
/// Always reduced modulo 12; there is no way to construct an out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PitchClass(u8);

impl PitchClass {
    /// Create a pitch class from any integer, reducing it modulo 12
    pub fn new(value: i32) -> Self {
        Self(value.rem_euclid(PITCH_CLASS_COUNT as i32) as u8)
    }

    /// Create a pitch class from a chroma bin index
    pub fn from_index(index: usize) -> Self {
        Self((index % PITCH_CLASS_COUNT) as u8)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn name(self) -> &'static str {
        PITCH_NAMES[self.index()]
    }

    /// Pitch class `semitones` above this one
    pub fn transpose(self, semitones: i32) -> Self {
        Self::new(self.0 as i32 + semitones)
    }

    /// Upward interval in semitones from `root` to this pitch class (0-11)
    pub fn interval_from(self, root: PitchClass) -> u8 {
        ((self.0 as i32 - root.0 as i32).rem_euclid(PITCH_CLASS_COUNT as i32)) as u8
    }

    /// Iterate all twelve pitch classes in ascending order
    pub fn all() -> impl Iterator<Item = PitchClass> {
        (0..PITCH_CLASS_COUNT).map(PitchClass::from_index)
    }

    /// Split a chord label into its leading root and the remaining suffix
    ///
    /// The root is an uppercase letter `A`-`G` followed by an optional
    /// accidental: `#` (sharp) or `b` (flat). Flats are accepted as aliases
    /// and normalize to the sharp spelling.
    ///
    /// Returns `None` if the label does not start with a valid root.
    pub fn split_label(label: &str) -> Option<(PitchClass, &str)> {
        let letter = label.chars().next()?;
        let natural = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };

        let rest = &label[letter.len_utf8()..];
        match rest.chars().next() {
            Some('#') => Some((PitchClass::new(natural + 1), &rest[1..])),
            Some('b') => Some((PitchClass::new(natural - 1), &rest[1..])),
            _ => Some((PitchClass::new(natural), rest)),
        }
    }

    /// Parse a bare note name ("C", "F#", "Bb")
    pub fn parse_name(name: &str) -> Option<PitchClass> {
        match Self::split_label(name.trim()) {
            Some((pitch, "")) => Some(pitch),
            _ => None,
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
