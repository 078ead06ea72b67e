//! Session lifecycle: one worker thread per session, one handle to stop it

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use futures::{future, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::analysis::{ChordPipeline, ChordTimeline, DetectedChord, TimelineWriter};
use crate::config::AppConfig;
use crate::engine::source::ChromaSource;
use crate::error::{log_chord_error, log_session_error, ChordError, SessionError};
use crate::fallback::FallbackGenerator;
use crate::telemetry::{PipelineCounters, PipelineStats};

/// What is producing the session's chords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Classified from a live chroma source
    Live,
    /// Canned progression; entries are marked simulated
    Simulated,
}

/// Owner of a running session
///
/// Holds the cancellation token and the worker's join handle. Readers get
/// the timeline through [`SessionHandle::timeline`] and never see the writer.
/// Dropping the handle cancels the session.
pub struct SessionHandle {
    mode: SessionMode,
    cancelled: Arc<AtomicBool>,
    stop_tx: Mutex<Option<mpsc::Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    timeline: ChordTimeline,
    events_tx: broadcast::Sender<DetectedChord>,
    counters: Arc<PipelineCounters>,
}

impl SessionHandle {
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Read-only view of the session's timeline
    pub fn timeline(&self) -> ChordTimeline {
        self.timeline.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `true` once the worker has exited on its own (e.g. replay exhausted)
    pub fn is_finished(&self) -> bool {
        match self.worker.lock() {
            Ok(worker) => worker.as_ref().map(|w| w.is_finished()).unwrap_or(true),
            Err(_) => true,
        }
    }

    pub fn stats(&self) -> PipelineStats {
        self.counters.snapshot()
    }

    /// Receive every entry appended from now on
    pub fn subscribe(&self) -> Result<broadcast::Receiver<DetectedChord>, SessionError> {
        if self.is_cancelled() {
            return Err(SessionError::AlreadyCancelled);
        }
        Ok(self.events_tx.subscribe())
    }

    /// Async stream of appended entries; lagged items are skipped
    pub fn stream(
        &self,
    ) -> Result<impl Stream<Item = DetectedChord> + Unpin + Send + 'static, SessionError> {
        let rx = self.subscribe()?;
        Ok(BroadcastStream::new(rx).filter_map(|item| {
            future::ready(match item {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!("[ChordSession] Subscriber lagging: {}", err);
                    None
                }
            })
        }))
    }

    /// Stop the worker and wait for it to exit
    ///
    /// After this returns no further entries are appended to the timeline.
    /// Calling it again is a no-op.
    pub fn cancel(&self) -> Result<(), SessionError> {
        self.cancelled.store(true, Ordering::SeqCst);

        // Dropping the sender wakes a fallback worker waiting on its timer
        let stop_tx = self
            .stop_tx
            .lock()
            .map_err(|_| SessionError::LockPoisoned {
                component: "stop channel".to_string(),
            })?
            .take();
        drop(stop_tx);

        let worker = self
            .worker
            .lock()
            .map_err(|_| SessionError::LockPoisoned {
                component: "session worker".to_string(),
            })?
            .take();

        if let Some(worker) = worker {
            worker.join().map_err(|_| SessionError::WorkerPanicked)?;
            tracing::info!(
                "[ChordSession] {:?} session stopped with {} entries",
                self.mode,
                self.timeline.len()
            );
        }
        Ok(())
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Err(err) = self.cancel() {
            log_session_error(&err, "SessionHandle::drop");
        }
    }
}

/// Start a chord session
///
/// With a source the live pipeline runs on a worker thread. Without one the
/// fallback generator plays a progression chosen from `title`; that is not
/// an error, the handle just reports [`SessionMode::Simulated`].
pub fn start_session(
    source: Option<Box<dyn ChromaSource>>,
    title: Option<&str>,
    config: &AppConfig,
) -> Result<SessionHandle, SessionError> {
    config.validate().map_err(rejected_config)?;

    let (writer, timeline) = ChordTimeline::create();
    let (events_tx, _) = broadcast::channel(config.session.broadcast_capacity);
    let cancelled = Arc::new(AtomicBool::new(false));
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let (mode, counters, worker) = match source {
        Some(source) => {
            let counters = source
                .counters()
                .unwrap_or_else(|| Arc::new(PipelineCounters::new()));
            let pipeline = ChordPipeline::new(config, writer)
                .with_counters(Arc::clone(&counters))
                .with_events(events_tx.clone());
            let worker = LiveWorker {
                source,
                pipeline,
                cancelled: Arc::clone(&cancelled),
                poll_interval: Duration::from_millis(config.session.poll_interval_ms),
            };
            let handle = thread::Builder::new()
                .name("chord-session".to_string())
                .spawn(move || worker.run())?;
            (SessionMode::Live, counters, handle)
        }
        None => {
            let generator =
                FallbackGenerator::new(title, &config.fallback).map_err(rejected_config)?;
            let counters = Arc::new(PipelineCounters::new());
            let worker = FallbackWorker {
                generator,
                writer,
                events_tx: events_tx.clone(),
                counters: Arc::clone(&counters),
                cancelled: Arc::clone(&cancelled),
                stop_rx,
            };
            let handle = thread::Builder::new()
                .name("chord-fallback".to_string())
                .spawn(move || worker.run())?;
            (SessionMode::Simulated, counters, handle)
        }
    };

    tracing::info!("[ChordSession] Started {:?} session", mode);

    Ok(SessionHandle {
        mode,
        cancelled,
        stop_tx: Mutex::new(Some(stop_tx)),
        worker: Mutex::new(Some(worker)),
        timeline,
        events_tx,
        counters,
    })
}

fn rejected_config(err: ChordError) -> SessionError {
    log_chord_error(&err, "start_session");
    SessionError::SpawnFailed {
        reason: err.to_string(),
    }
}

struct LiveWorker {
    source: Box<dyn ChromaSource>,
    pipeline: ChordPipeline,
    cancelled: Arc<AtomicBool>,
    poll_interval: Duration,
}

impl LiveWorker {
    fn run(mut self) {
        tracing::info!("[ChordSession] Live worker started");

        while !self.cancelled.load(Ordering::SeqCst) {
            match self.source.next_frame() {
                Ok(Some(sample)) => {
                    self.pipeline.process(&sample);
                }
                Ok(None) => {
                    if self.source.is_exhausted() {
                        tracing::info!("[ChordSession] Source exhausted, worker exiting");
                        break;
                    }
                    thread::sleep(self.poll_interval);
                }
                Err(err) => self.pipeline.record_fault(&err),
            }
        }

        let stats = self.pipeline.counters().snapshot();
        tracing::info!(
            "[ChordSession] Live worker done: {} frames, {} skipped, {} chords",
            stats.frames_received,
            stats.frames_skipped,
            stats.chords_emitted
        );
    }
}

struct FallbackWorker {
    generator: FallbackGenerator,
    writer: TimelineWriter,
    events_tx: broadcast::Sender<DetectedChord>,
    counters: Arc<PipelineCounters>,
    cancelled: Arc<AtomicBool>,
    stop_rx: mpsc::Receiver<()>,
}

impl FallbackWorker {
    fn run(mut self) {
        let interval = Duration::from_secs_f64(self.generator.chord_duration_secs());
        self.generator.start();
        tracing::info!(
            "[ChordSession] Fallback worker started ({} progression)",
            self.generator.progression()
        );

        while !self.cancelled.load(Ordering::SeqCst) {
            let Some(entry) = self.generator.next_chord() else {
                break;
            };
            if self.writer.append(entry) {
                self.counters.record_emitted();
                let _ = self.events_tx.send(entry);
            }

            match self.stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.generator.stop();
        tracing::info!("[ChordSession] Fallback worker stopped");
    }
}
