//! Chroma sources: the seam between feature extraction and the session worker

use std::collections::VecDeque;
use std::sync::Arc;

use rtrb::{Consumer, Producer, PushError, RingBuffer};

use crate::analysis::ChromaSample;
use crate::config::SessionConfig;
use crate::error::FrameError;
use crate::telemetry::PipelineCounters;

/// Anything that yields chroma frames in arrival order
///
/// `next_frame` must not block for long: the session worker polls it and
/// checks for cancellation between calls.
pub trait ChromaSource: Send {
    /// `Ok(Some(_))` for a frame, `Ok(None)` when nothing is ready yet,
    /// `Err(_)` when the source failed to produce this frame
    fn next_frame(&mut self) -> Result<Option<ChromaSample>, FrameError>;

    /// `true` once no further frames will ever arrive
    fn is_exhausted(&self) -> bool {
        false
    }

    /// Counters this source already reports into, if any
    fn counters(&self) -> Option<Arc<PipelineCounters>> {
        None
    }
}

/// Create a bounded lock-free queue between an audio context and a session
///
/// The feed is the producer half and may live on any thread; the source is
/// handed to [`start_session`](crate::engine::start_session).
pub fn chroma_queue(capacity: usize) -> (ChromaFeed, QueueChromaSource) {
    let (producer, consumer) = RingBuffer::new(capacity.max(1));
    let counters = Arc::new(PipelineCounters::new());
    (
        ChromaFeed {
            producer,
            counters: Arc::clone(&counters),
        },
        QueueChromaSource { consumer, counters },
    )
}

/// [`chroma_queue`] sized by `session.queue_capacity`
pub fn chroma_queue_for(config: &SessionConfig) -> (ChromaFeed, QueueChromaSource) {
    chroma_queue(config.queue_capacity)
}

/// Producer half of [`chroma_queue`]
pub struct ChromaFeed {
    producer: Producer<ChromaSample>,
    counters: Arc<PipelineCounters>,
}

impl ChromaFeed {
    /// Push one frame without blocking
    ///
    /// A full queue drops the frame and reports [`FrameError::QueueFull`].
    pub fn push(&mut self, sample: ChromaSample) -> Result<(), FrameError> {
        match self.producer.push(sample) {
            Ok(()) => Ok(()),
            Err(PushError::Full(_)) => {
                self.counters.record_dropped();
                Err(FrameError::QueueFull)
            }
        }
    }

    /// Free slots left in the queue
    pub fn slots(&self) -> usize {
        self.producer.slots()
    }
}

/// Consumer half of [`chroma_queue`]
pub struct QueueChromaSource {
    consumer: Consumer<ChromaSample>,
    counters: Arc<PipelineCounters>,
}

impl ChromaSource for QueueChromaSource {
    fn next_frame(&mut self) -> Result<Option<ChromaSample>, FrameError> {
        Ok(self.consumer.pop().ok())
    }

    /// The feed was dropped and everything it pushed has been consumed
    fn is_exhausted(&self) -> bool {
        self.consumer.is_abandoned() && self.consumer.is_empty()
    }

    fn counters(&self) -> Option<Arc<PipelineCounters>> {
        Some(Arc::clone(&self.counters))
    }
}

/// Replays a recorded list of samples, then reports exhaustion
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    frames: VecDeque<Result<ChromaSample, FrameError>>,
}

impl ReplaySource {
    pub fn new(samples: impl IntoIterator<Item = ChromaSample>) -> Self {
        Self {
            frames: samples.into_iter().map(Ok).collect(),
        }
    }

    /// Queue a source fault at the current end of the recording
    pub fn push_fault(&mut self, err: FrameError) {
        self.frames.push_back(Err(err));
    }

    pub fn push_sample(&mut self, sample: ChromaSample) {
        self.frames.push_back(Ok(sample));
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl ChromaSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<ChromaSample>, FrameError> {
        self.frames.pop_front().transpose()
    }

    fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp_secs: f64) -> ChromaSample {
        ChromaSample::new([0.5; 12], 0.1, timestamp_secs)
    }

    #[test]
    fn test_queue_delivers_in_order() {
        let (mut feed, mut source) = chroma_queue(4);
        feed.push(sample(0.0)).unwrap();
        feed.push(sample(0.1)).unwrap();

        assert_eq!(source.next_frame().unwrap().unwrap().timestamp_secs, 0.0);
        assert_eq!(source.next_frame().unwrap().unwrap().timestamp_secs, 0.1);
        assert!(source.next_frame().unwrap().is_none());
        assert!(!source.is_exhausted());
    }

    #[test]
    fn test_full_queue_drops_and_counts() {
        let (mut feed, source) = chroma_queue(2);
        feed.push(sample(0.0)).unwrap();
        feed.push(sample(0.1)).unwrap();
        assert_eq!(feed.push(sample(0.2)), Err(FrameError::QueueFull));
        assert_eq!(feed.slots(), 0);

        let stats = source.counters().unwrap().snapshot();
        assert_eq!(stats.frames_dropped, 1);
    }

    #[test]
    fn test_queue_capacity_follows_session_config() {
        let config = SessionConfig {
            queue_capacity: 3,
            ..SessionConfig::default()
        };
        let (mut feed, _source) = chroma_queue_for(&config);
        assert_eq!(feed.slots(), 3);

        for i in 0..3 {
            feed.push(sample(i as f64 * 0.1)).unwrap();
        }
        assert_eq!(feed.push(sample(0.3)), Err(FrameError::QueueFull));

        let (feed, _source) = chroma_queue_for(&SessionConfig::default());
        assert_eq!(feed.slots(), SessionConfig::default().queue_capacity);
    }

    #[test]
    fn test_queue_exhausted_after_feed_dropped_and_drained() {
        let (mut feed, mut source) = chroma_queue(4);
        feed.push(sample(0.0)).unwrap();
        drop(feed);

        assert!(!source.is_exhausted());
        assert!(source.next_frame().unwrap().is_some());
        assert!(source.is_exhausted());
    }

    #[test]
    fn test_replay_source_yields_faults_in_place() {
        let mut source = ReplaySource::new(vec![sample(0.0)]);
        source.push_fault(FrameError::SourceFault {
            details: "clipped".to_string(),
        });
        source.push_sample(sample(0.2));
        assert_eq!(source.remaining(), 3);

        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().is_err());
        assert_eq!(source.next_frame().unwrap().unwrap().timestamp_secs, 0.2);
        assert!(source.is_exhausted());
        assert!(source.next_frame().unwrap().is_none());
    }
}
