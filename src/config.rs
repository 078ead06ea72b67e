//! Configuration management for engine calibration constants
//!
//! This module provides runtime configuration loading from JSON files so the
//! classifier thresholds, the stabilizer re-trigger window and the fallback
//! timing can be tuned without recompilation. Every field has a default and
//! missing fields in the JSON file fall back to it.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::pitch::PITCH_CLASS_COUNT;
use crate::error::ChordError;

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub classifier: ClassifierConfig,
    pub stabilizer: StabilizerConfig,
    pub fallback: FallbackConfig,
    pub session: SessionConfig,
}

/// Chord classifier calibration constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Frames whose RMS energy is below this gate classify as "no chord"
    pub energy_gate: f32,
    /// Fraction of the strongest bin a bin must exceed to count as active
    pub peak_ratio: f32,
    /// Minimum template score required to accept a match
    pub min_match_score: f32,
    /// Fewer active notes than this classify as "no chord"
    pub min_active_notes: usize,
    /// More active notes than this classify as "no chord" (diffuse chroma)
    pub max_active_notes: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            // Same conservative noise floor the RMS gates default to
            energy_gate: 0.01,
            peak_ratio: 0.5,
            min_match_score: 0.5,
            min_active_notes: 2,
            max_active_notes: 6,
        }
    }
}

/// Temporal stabilizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    /// The same label is appended again only after this many seconds
    pub retrigger_interval_secs: f64,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            retrigger_interval_secs: 2.0,
        }
    }
}

/// Fallback progression generator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Time between simulated chords, both wall-clock and timestamp spacing
    pub chord_duration_ms: u64,
    /// Lower bound (inclusive) of the simulated confidence range
    pub confidence_min: f32,
    /// Upper bound (exclusive) of the simulated confidence range
    pub confidence_max: f32,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            chord_duration_ms: 2000,
            confidence_min: 0.75,
            confidence_max: 1.0,
        }
    }
}

/// Session worker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sleep between polls when the chroma source has nothing ready
    pub poll_interval_ms: u64,
    /// Capacity of the push queue between the audio context and the worker
    pub queue_capacity: usize,
    /// Capacity of the detected-chord broadcast channel
    pub broadcast_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1,
            queue_capacity: 256,
            broadcast_capacity: 100,
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ChordError {
    ChordError::InvalidConfig {
        field: field.to_string(),
        reason: reason.into(),
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ChordError> {
        if !self.energy_gate.is_finite() || self.energy_gate < 0.0 {
            return Err(invalid("energy_gate", "must be a non-negative number"));
        }
        if !(self.peak_ratio > 0.0 && self.peak_ratio < 1.0) {
            return Err(invalid("peak_ratio", "must be in (0, 1)"));
        }
        if !(self.min_match_score > 0.0 && self.min_match_score <= 1.0) {
            return Err(invalid("min_match_score", "must be in (0, 1]"));
        }
        if self.min_active_notes < 2 {
            return Err(invalid("min_active_notes", "a chord needs at least 2 notes"));
        }
        // A fully lit octave has no tonal centre
        if self.max_active_notes < self.min_active_notes
            || self.max_active_notes >= PITCH_CLASS_COUNT
        {
            return Err(invalid(
                "max_active_notes",
                "must be between min_active_notes and 11",
            ));
        }
        Ok(())
    }
}

impl StabilizerConfig {
    pub fn validate(&self) -> Result<(), ChordError> {
        if !self.retrigger_interval_secs.is_finite() || self.retrigger_interval_secs < 0.0 {
            return Err(invalid(
                "retrigger_interval_secs",
                "must be a non-negative number of seconds",
            ));
        }
        Ok(())
    }
}

impl FallbackConfig {
    pub fn validate(&self) -> Result<(), ChordError> {
        if self.chord_duration_ms == 0 {
            return Err(invalid("chord_duration_ms", "must be greater than 0"));
        }
        let range_ok = (0.0..=1.0).contains(&self.confidence_min)
            && (0.0..=1.0).contains(&self.confidence_max)
            && self.confidence_min < self.confidence_max;
        if !range_ok {
            return Err(invalid(
                "confidence_min/confidence_max",
                "must satisfy 0 <= min < max <= 1",
            ));
        }
        Ok(())
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ChordError> {
        if self.queue_capacity == 0 {
            return Err(invalid("queue_capacity", "must be greater than 0"));
        }
        if self.broadcast_capacity == 0 {
            return Err(invalid("broadcast_capacity", "must be greater than 0"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration. If the file doesn't exist, the JSON is
    /// invalid, or the values fail validation, the defaults are returned.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                Ok(config) => match config.validate() {
                    Ok(()) => {
                        log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                        config
                    }
                    Err(err) => {
                        log::warn!(
                            "[Config] Rejected configuration from {:?}: {}. Using defaults.",
                            path.as_ref(),
                            err
                        );
                        Self::default()
                    }
                },
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset location
    pub fn load() -> Self {
        Self::load_from_file("assets/chord_config.json")
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ChordError> {
        self.classifier.validate()?;
        self.stabilizer.validate()?;
        self.fallback.validate()?;
        self.session.validate()
    }
}
