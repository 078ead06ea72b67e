//! Canned chord progressions and title-based selection

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Built-in progression families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progression {
    Worship,
    Ballad,
    Pop,
    Blues,
    Jazz,
}

impl Progression {
    pub const ALL: [Progression; 5] = [
        Progression::Worship,
        Progression::Ballad,
        Progression::Pop,
        Progression::Blues,
        Progression::Jazz,
    ];

    /// Chord labels of one pass through the progression
    pub fn chords(self) -> &'static [&'static str] {
        match self {
            Progression::Worship => &["G", "D", "Em", "C"],
            Progression::Ballad => &["C", "Am", "F", "G"],
            Progression::Pop => &["C", "G", "Am", "F"],
            Progression::Blues => &["A7", "D7", "A7", "E7"],
            Progression::Jazz => &["Dm7", "G7", "Cmaj7", "Am7"],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Progression::Worship => "worship",
            Progression::Ballad => "ballad",
            Progression::Pop => "pop",
            Progression::Blues => "blues",
            Progression::Jazz => "jazz",
        }
    }

    /// Progression named by a keyword in `title`, if any
    pub fn from_keywords(title: &str) -> Option<Progression> {
        let title = title.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(words, _)| words.iter().any(|word| title.contains(word)))
            .map(|&(_, progression)| progression)
    }
}

impl fmt::Display for Progression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keyword groups, checked in order
const KEYWORDS: [(&[&str], Progression); 4] = [
    (
        &["god", "jesus", "holy", "lord", "praise", "grace"],
        Progression::Worship,
    ),
    (&["love", "heart"], Progression::Ballad),
    (&["blues"], Progression::Blues),
    (&["jazz", "swing"], Progression::Jazz),
];

/// Choose a progression for a song title
///
/// Keyword matches win. Any other non-empty title maps to a fixed progression
/// through [`stable_hash`], so the same title always gets the same chords.
/// Only a missing or blank title draws from `rng`.
pub fn select_progression<R: Rng + ?Sized>(title: Option<&str>, rng: &mut R) -> Progression {
    let title = title.map(str::trim).filter(|title| !title.is_empty());
    match title {
        Some(title) => Progression::from_keywords(title).unwrap_or_else(|| {
            let index = stable_hash(&title.to_lowercase()) % Progression::ALL.len() as u64;
            Progression::ALL[index as usize]
        }),
        None => Progression::ALL[rng.gen_range(0..Progression::ALL.len())],
    }
}

/// 64-bit FNV-1a; unlike `DefaultHasher` it does not change between builds
pub fn stable_hash(text: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    text.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ChordLabel;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_every_progression_uses_known_labels() {
        for progression in Progression::ALL {
            for label in progression.chords() {
                assert!(
                    label.parse::<ChordLabel>().is_ok(),
                    "{} contains unknown label {}",
                    progression,
                    label
                );
            }
        }
    }

    #[test]
    fn test_keyword_selection() {
        let mut rng = StdRng::seed_from_u64(1);
        let cases = [
            ("Amazing Grace", Progression::Worship),
            ("HOLY SPIRIT", Progression::Worship),
            ("Jesus Loves Me", Progression::Worship),
            ("Endless Love", Progression::Ballad),
            ("Heartbeat", Progression::Ballad),
            ("St. Louis Blues", Progression::Blues),
            ("Swing Low", Progression::Jazz),
            ("Smooth Jazz Nights", Progression::Jazz),
        ];
        for (title, expected) in cases {
            assert_eq!(select_progression(Some(title), &mut rng), expected, "{}", title);
        }
    }

    #[test]
    fn test_jesus_always_worship() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(
                select_progression(Some("jesus"), &mut rng),
                Progression::Worship
            );
        }
    }

    #[test]
    fn test_unmatched_title_is_stable() {
        let first = select_progression(Some("Yellow Submarine"), &mut StdRng::seed_from_u64(1));
        for seed in 2..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(select_progression(Some("Yellow Submarine"), &mut rng), first);
            assert_eq!(select_progression(Some("  yellow submarine "), &mut rng), first);
        }
    }

    #[test]
    fn test_blank_title_is_random() {
        let mut rng = StdRng::seed_from_u64(7);
        let picks: std::collections::HashSet<Progression> = (0..100)
            .map(|_| select_progression(Some("   "), &mut rng))
            .collect();
        assert!(picks.len() > 1);
    }

    #[test]
    fn test_stable_hash_known_values() {
        assert_eq!(stable_hash(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(stable_hash("a"), 0xaf63_dc4c_8601_ec8c);
        assert_ne!(stable_hash("abc"), stable_hash("acb"));
    }
}
