// Fallback progression generator
//
// When no chroma source exists the session still needs a chord stream, so
// this module plays back a canned progression picked from the song title.
// Every entry it yields is marked `ChordOrigin::Simulated`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub mod progressions;

pub use progressions::{select_progression, stable_hash, Progression};

use crate::analysis::{ChordLabel, DetectedChord};
use crate::config::FallbackConfig;
use crate::error::ChordError;

/// Generator lifecycle; `Stopped` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorState {
    Idle,
    Running,
    Stopped,
}

/// Emits a looping canned progression with synthetic timestamps
#[derive(Debug)]
pub struct FallbackGenerator {
    progression: Progression,
    chords: Vec<ChordLabel>,
    chord_duration_secs: f64,
    confidence_min: f32,
    confidence_max: f32,
    index: u64,
    state: GeneratorState,
    rng: StdRng,
}

impl FallbackGenerator {
    /// Create a generator for `title` with an entropy-seeded RNG
    pub fn new(title: Option<&str>, config: &FallbackConfig) -> Result<Self, ChordError> {
        Self::from_rng(title, config, StdRng::from_entropy())
    }

    /// Create a reproducible generator
    pub fn with_seed(
        title: Option<&str>,
        config: &FallbackConfig,
        seed: u64,
    ) -> Result<Self, ChordError> {
        Self::from_rng(title, config, StdRng::seed_from_u64(seed))
    }

    fn from_rng(
        title: Option<&str>,
        config: &FallbackConfig,
        mut rng: StdRng,
    ) -> Result<Self, ChordError> {
        config.validate()?;

        let progression = select_progression(title, &mut rng);
        let chords = progression
            .chords()
            .iter()
            .map(|label| label.parse::<ChordLabel>())
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(
            "[Fallback] Using {} progression for title {:?}",
            progression,
            title
        );

        Ok(Self {
            progression,
            chords,
            chord_duration_secs: config.chord_duration_ms as f64 / 1000.0,
            confidence_min: config.confidence_min,
            confidence_max: config.confidence_max,
            index: 0,
            state: GeneratorState::Idle,
            rng,
        })
    }

    pub fn progression(&self) -> Progression {
        self.progression
    }

    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn chord_duration_secs(&self) -> f64 {
        self.chord_duration_secs
    }

    /// Idle -> Running. Has no effect in any other state.
    pub fn start(&mut self) {
        if self.state == GeneratorState::Idle {
            self.state = GeneratorState::Running;
        }
    }

    /// Any state -> Stopped
    pub fn stop(&mut self) {
        self.state = GeneratorState::Stopped;
    }

    /// Next chord of the loop, or `None` unless running
    pub fn next_chord(&mut self) -> Option<DetectedChord> {
        if self.state != GeneratorState::Running {
            return None;
        }

        let position = (self.index % self.chords.len() as u64) as usize;
        let timestamp = self.index as f64 * self.chord_duration_secs;
        let confidence = self.rng.gen_range(self.confidence_min..self.confidence_max);
        self.index += 1;

        Some(DetectedChord::simulated(
            self.chords[position],
            timestamp,
            confidence,
        ))
    }
}
