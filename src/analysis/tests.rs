use super::*;

fn c_major(timestamp_secs: f64) -> ChromaSample {
    let mut bins = [0.01; 12];
    bins[0] = 1.0;
    bins[4] = 0.9;
    bins[7] = 0.8;
    ChromaSample::new(bins, 0.2, timestamp_secs)
}

fn a_minor(timestamp_secs: f64) -> ChromaSample {
    let mut bins = [0.01; 12];
    bins[9] = 1.0;
    bins[0] = 0.8;
    bins[4] = 0.8;
    ChromaSample::new(bins, 0.2, timestamp_secs)
}

fn silence(timestamp_secs: f64) -> ChromaSample {
    ChromaSample::new([0.0; 12], 0.0, timestamp_secs)
}

fn create_pipeline() -> (ChordPipeline, ChordTimeline) {
    let (writer, timeline) = ChordTimeline::create();
    (ChordPipeline::new(&AppConfig::default(), writer), timeline)
}

#[test]
fn test_pipeline_builds_sparse_timeline() {
    let (mut pipeline, timeline) = create_pipeline();

    // 1.5s of C, 0.5s of silence, 1s of Am, then C again
    let mut t = 0.0;
    let mut frames = Vec::new();
    while t < 1.5 {
        frames.push(c_major(t));
        t += 0.04;
    }
    while t < 2.0 {
        frames.push(silence(t));
        t += 0.04;
    }
    while t < 3.0 {
        frames.push(a_minor(t));
        t += 0.04;
    }
    frames.push(c_major(t));

    for frame in &frames {
        pipeline.process(frame);
    }

    let labels: Vec<String> = timeline
        .snapshot()
        .iter()
        .map(|entry| entry.chord.to_string())
        .collect();
    assert_eq!(labels, vec!["C", "Am", "C"]);

    let stats = pipeline.counters().snapshot();
    assert_eq!(stats.frames_received, frames.len() as u64);
    assert_eq!(stats.chords_emitted, 3);
    assert!(stats.frames_without_chord > 0);
    assert_eq!(stats.frames_skipped, 0);
}

#[test]
fn test_timestamps_are_non_decreasing() {
    let (mut pipeline, timeline) = create_pipeline();
    for frame in 0..200 {
        let t = frame as f64 * 0.05;
        let sample = if (frame / 30) % 2 == 0 {
            c_major(t)
        } else {
            a_minor(t)
        };
        pipeline.process(&sample);
    }

    let entries = timeline.snapshot();
    assert!(entries.len() > 2);
    assert!(entries
        .windows(2)
        .all(|pair| pair[0].timestamp <= pair[1].timestamp));
    assert!(entries.iter().all(|entry| !entry.is_simulated()));
}

#[test]
fn test_invalid_frame_is_skipped_and_processing_continues() {
    let (mut pipeline, timeline) = create_pipeline();

    pipeline.process(&c_major(0.0));
    let bad = ChromaSample::new([1.0; 12], f32::NAN, 0.1);
    assert!(pipeline.process(&bad).is_none());
    pipeline.record_fault(&FrameError::SourceFault {
        details: "feature extraction failed".to_string(),
    });
    assert!(pipeline.process(&a_minor(0.2)).is_some());

    assert_eq!(timeline.len(), 2);
    let stats = pipeline.counters().snapshot();
    assert_eq!(stats.frames_skipped, 2);
    assert_eq!(stats.frames_received, 4);
}

#[test]
fn test_appended_entries_are_broadcast() {
    let (writer, timeline) = ChordTimeline::create();
    let (tx, mut rx) = broadcast::channel(16);
    let mut pipeline = ChordPipeline::new(&AppConfig::default(), writer).with_events(tx);

    pipeline.process(&c_major(0.0));
    pipeline.process(&c_major(0.1));
    pipeline.process(&a_minor(0.2));

    let first = rx.try_recv().unwrap();
    let second = rx.try_recv().unwrap();
    assert_eq!(first.chord, "C");
    assert_eq!(second.chord, "Am");
    assert!(rx.try_recv().is_err());
    assert_eq!(timeline.snapshot(), vec![first, second]);
}

#[test]
fn test_reset_allows_immediate_repeat() {
    let (mut pipeline, timeline) = create_pipeline();
    pipeline.process(&c_major(0.0));
    pipeline.process(&c_major(0.5));
    assert_eq!(timeline.len(), 1);

    pipeline.reset();
    pipeline.process(&c_major(0.6));
    assert_eq!(timeline.len(), 2);
}

fn g_major(timestamp_secs: f64) -> ChromaSample {
    let mut bins = [0.01; 12];
    bins[7] = 1.0;
    bins[11] = 0.8;
    bins[2] = 0.8;
    ChromaSample::new(bins, 0.2, timestamp_secs)
}

#[test]
fn test_refused_append_does_not_suppress_later_repeat() {
    let (mut pipeline, timeline) = create_pipeline();
    assert!(pipeline.process(&g_major(5.0)).is_some());

    pipeline.reset();
    // Behind the timeline tail: refused by the writer, so not remembered
    assert!(pipeline.process(&c_major(4.0)).is_none());
    assert!(pipeline.process(&c_major(5.5)).is_some());

    let labels: Vec<(String, f64)> = timeline
        .snapshot()
        .iter()
        .map(|entry| (entry.chord.to_string(), entry.timestamp))
        .collect();
    assert_eq!(labels, vec![("G".to_string(), 5.0), ("C".to_string(), 5.5)]);
}
