use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use chord_engine::analysis::{
    expand, ChordClassifier, ChromaVector, DetectedChord, CHORD_TEMPLATES,
};
use chord_engine::config::AppConfig;
use chord_engine::engine::{start_session, ReplaySource};
use chord_engine::fallback::FallbackGenerator;
use chord_engine::fixtures::{ExpectationDiff, FixtureCatalog, FixtureProcessor};
use chord_engine::telemetry::PipelineStats;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use serde::Serialize;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "chord_cli",
    about = "Deterministic fixture harness for the chord recognition engine"
)]
struct Cli {
    /// Override directory containing fixture assets (defaults to ./fixtures)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// Engine configuration JSON (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a single chroma frame given as 12 comma-separated energies
    Classify {
        #[arg(long)]
        chroma: String,
        #[arg(long, default_value_t = 1.0)]
        rms: f32,
    },
    /// Print the notes of a chord label
    Expand { label: String },
    /// Run a fixture through the pipeline and compare against its expectations
    Replay {
        #[arg(long)]
        fixture: String,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Drive the fixture through a threaded session instead of inline
        #[arg(long)]
        session: bool,
    },
    /// Print a simulated progression for a song title
    Simulate {
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value_t = 8)]
        count: usize,
        #[arg(long)]
        seed: Option<u64>,
        /// Run a real fallback session and wait for each chord
        #[arg(long)]
        realtime: bool,
    },
    /// List the chord vocabulary
    Templates,
    /// List available fixtures on disk
    DumpFixtures,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_default();

    match cli.command {
        Commands::Classify { chroma, rms } => run_classify(&config, &chroma, rms),
        Commands::Expand { label } => run_expand(&label),
        Commands::Replay {
            fixture,
            output,
            session,
        } => run_replay(&catalog, &config, &fixture, output, session),
        Commands::Simulate {
            title,
            count,
            seed,
            realtime,
        } => run_simulate(&config, title.as_deref(), count, seed, realtime),
        Commands::Templates => run_templates(),
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn run_classify(config: &AppConfig, chroma: &str, rms: f32) -> Result<ExitCode> {
    let bins: Vec<f32> = chroma
        .split(',')
        .map(|value| {
            value
                .trim()
                .parse::<f32>()
                .with_context(|| format!("invalid chroma value '{value}'"))
        })
        .collect::<Result<_>>()?;
    let bins: [f32; 12] = bins
        .try_into()
        .map_err(|bins: Vec<f32>| anyhow!("expected 12 chroma values, got {}", bins.len()))?;

    let classifier = ChordClassifier::new(config.classifier.clone());
    let classification = classifier.classify(&ChromaVector::new(bins), rms);
    println!("{}", serde_json::to_string(&classification)?);
    Ok(ExitCode::from(0))
}

fn run_expand(label: &str) -> Result<ExitCode> {
    let notes = expand(label);
    if notes.is_empty() {
        bail!("'{label}' does not start with a note name");
    }
    println!("{}", serde_json::to_string(&notes)?);
    Ok(ExitCode::from(0))
}

fn run_replay(
    catalog: &FixtureCatalog,
    config: &AppConfig,
    fixture: &str,
    output_path: Option<PathBuf>,
    threaded: bool,
) -> Result<ExitCode> {
    let data = catalog.load(fixture)?;

    let (actual, stats) = if threaded {
        let handle = start_session(
            Some(Box::new(ReplaySource::new(data.samples.iter().copied()))),
            None,
            config,
        )
        .with_context(|| format!("starting session for fixture {fixture}"))?;
        while !handle.is_finished() {
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        handle.cancel()?;
        (handle.timeline().snapshot(), Some(handle.stats()))
    } else {
        (FixtureProcessor::new(config.clone()).run(&data), None)
    };

    emit_report(&data.name, &actual, stats, output_path)?;

    if let Some(expectations) = data.expect.as_ref() {
        match expectations.verify(&actual) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        }
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_simulate(
    config: &AppConfig,
    title: Option<&str>,
    count: usize,
    seed: Option<u64>,
    realtime: bool,
) -> Result<ExitCode> {
    if realtime {
        let handle = start_session(None, title, config)?;
        let mut stream = handle.stream()?;
        let timeline = handle.timeline();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("building tokio runtime")?;
        runtime.block_on(async {
            // Entries are published after they are appended
            while timeline.len() < count {
                if stream.next().await.is_none() {
                    break;
                }
            }
        });
        for entry in timeline.snapshot().iter().take(count) {
            println!("{}", serde_json::to_string(entry)?);
        }
        handle.cancel()?;
        return Ok(ExitCode::from(0));
    }

    let mut generator = match seed {
        Some(seed) => FallbackGenerator::with_seed(title, &config.fallback, seed)?,
        None => FallbackGenerator::new(title, &config.fallback)?,
    };
    eprintln!("progression: {}", generator.progression());
    generator.start();
    for entry in std::iter::from_fn(|| generator.next_chord()).take(count) {
        println!("{}", serde_json::to_string(&entry)?);
    }
    generator.stop();
    Ok(ExitCode::from(0))
}

fn run_templates() -> Result<ExitCode> {
    for template in CHORD_TEMPLATES.iter() {
        let name = if template.name.is_empty() {
            "(major)"
        } else {
            template.name
        };
        println!("{:<8} {:?}", name, template.intervals);
    }
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        println!("{} -> {}", metadata.name, metadata.path.display());
    }
    Ok(ExitCode::from(0))
}

fn emit_report(
    fixture: &str,
    events: &[DetectedChord],
    stats: Option<PipelineStats>,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let report = FixtureReportPayload {
        fixture,
        event_count: events.len(),
        events,
        stats,
    };
    let json = serde_json::to_string_pretty(&report)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct FixtureReportPayload<'a> {
    fixture: &'a str,
    event_count: usize,
    #[serde(skip_serializing_if = "slice_empty")]
    events: &'a [DetectedChord],
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<PipelineStats>,
}

fn slice_empty(events: &&[DetectedChord]) -> bool {
    events.is_empty()
}
