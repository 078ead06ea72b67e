//! Fixture utilities for the deterministic CLI harness.
//!
//! A fixture is one JSON file holding a recorded list of chroma samples and,
//! optionally, the chord timeline it is expected to produce. The catalog
//! discovers fixtures on disk and the processor replays them through the
//! chord pipeline synchronously, so results do not depend on thread timing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::{ChordLabel, ChordPipeline, ChordTimeline, ChromaSample, DetectedChord};
use crate::config::AppConfig;

/// Default location for fixture JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

/// A recorded chroma stream plus optional expectations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromaFixture {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub samples: Vec<ChromaSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<FixtureExpectations>,
}

impl ChromaFixture {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parsing chroma fixture")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
    }

    /// Length of the recording in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples
            .last()
            .map(|sample| sample.timestamp_secs)
            .unwrap_or(0.0)
    }
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureExpectations {
    pub events: Vec<ExpectedChord>,
}

impl FixtureExpectations {
    /// Compare an actual timeline with the expected one, entry by entry
    pub fn verify(&self, actual: &[DetectedChord]) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        for (idx, expected) in self.events.iter().enumerate() {
            match actual.get(idx) {
                Some(entry) => {
                    let delta = (entry.timestamp - expected.timestamp).abs();
                    if entry.chord != expected.chord || delta > expected.tolerance_secs {
                        failures.push(ExpectationFailure {
                            index: idx,
                            expected: Some(expected.clone()),
                            actual: Some(*entry),
                            delta_secs: Some(delta),
                        });
                    }
                }
                None => failures.push(ExpectationFailure {
                    index: idx,
                    expected: Some(expected.clone()),
                    actual: None,
                    delta_secs: None,
                }),
            }
        }

        for (idx, entry) in actual.iter().enumerate().skip(self.events.len()) {
            failures.push(ExpectationFailure {
                index: idx,
                expected: None,
                actual: Some(*entry),
                delta_secs: None,
            });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff { failures })
        }
    }
}

/// Expected timeline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedChord {
    pub chord: ChordLabel,
    pub timestamp: f64,
    #[serde(default = "default_tolerance")]
    pub tolerance_secs: f64,
}

fn default_tolerance() -> f64 {
    0.05
}

/// Outcome of comparing actual results with expectations.
#[derive(Debug)]
pub struct ExpectationDiff {
    pub failures: Vec<ExpectationFailure>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "failures": self.failures.iter().map(|failure| {
                serde_json::json!({
                    "index": failure.index,
                    "expected": failure.expected,
                    "actual": failure.actual,
                    "delta_secs": failure.delta_secs,
                })
            }).collect::<Vec<_>>()
        })
    }
}

/// Detailed diff entry for a single failure.
///
/// `expected` is `None` for surplus entries, `actual` is `None` for
/// missing ones.
#[derive(Debug)]
pub struct ExpectationFailure {
    pub index: usize,
    pub expected: Option<ExpectedChord>,
    pub actual: Option<DetectedChord>,
    pub delta_secs: Option<f64>,
}

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub path: PathBuf,
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                fixtures.push(self.metadata_for_path(&path)?);
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load a fixture by name (file stem) or by path.
    pub fn load(&self, fixture: &str) -> Result<ChromaFixture> {
        let path = self.resolve_fixture_path(fixture)?;
        ChromaFixture::load(path)
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.json"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }

    fn metadata_for_path(&self, path: &Path) -> Result<FixtureMetadata> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("Invalid fixture name for {}", path.display()))?
            .to_string();
        Ok(FixtureMetadata {
            name,
            path: path.to_path_buf(),
        })
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

/// Replays fixtures through the chord pipeline on the calling thread.
pub struct FixtureProcessor {
    config: AppConfig,
}

impl FixtureProcessor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, fixture: &ChromaFixture) -> Vec<DetectedChord> {
        let (writer, timeline) = ChordTimeline::create();
        let mut pipeline = ChordPipeline::new(&self.config, writer);
        for sample in &fixture.samples {
            pipeline.process(sample);
        }
        timeline.snapshot()
    }
}
