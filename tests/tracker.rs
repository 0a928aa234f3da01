//! Shot tracker and shot log tests.

use std::time::Duration;

use shotdetect::{FrameMark, ShotDetectError, ShotEvent, ShotLog, ShotTracker, TrackerState};

/// Feed boundary flags for frames `2..` after starting at frame 1, then
/// finalize at the last frame.
fn run_flags(flags: &[bool]) -> Vec<ShotEvent> {
    let at = |frame: u64| Duration::from_millis(frame * 40);
    let (mut tracker, begin) = ShotTracker::start(1, at(1));
    let mut events = vec![begin];

    let mut last = 1;
    for (index, &boundary) in flags.iter().enumerate() {
        let frame = index as u64 + 2;
        events.extend(tracker.observe(boundary, frame, at(frame)));
        last = frame;
    }
    events.extend(tracker.finish(last, at(last)));
    events
}

fn summary(events: &[ShotEvent]) -> Vec<(&'static str, u64)> {
    events.iter().map(|event| (event.kind(), event.frame())).collect()
}

// ── transitions ────────────────────────────────────────────────────

#[test]
fn no_boundaries_yield_one_shot() {
    let events = run_flags(&[false; 5]);
    assert_eq!(summary(&events), vec![("shot_begin", 1), ("shot_end", 6)]);
}

#[test]
fn hard_cut_yields_one_end_and_one_begin() {
    let events = run_flags(&[false, true, false, false]);
    assert_eq!(
        summary(&events),
        vec![
            ("shot_begin", 1),
            ("shot_end", 3),
            ("shot_begin", 4),
            ("shot_end", 5)
        ]
    );
}

#[test]
fn gradual_transition_is_absorbed() {
    let events = run_flags(&[false, true, true, true, true, false, false]);
    assert_eq!(
        summary(&events),
        vec![
            ("shot_begin", 1),
            ("shot_end", 3),
            ("shot_begin", 7),
            ("shot_end", 8)
        ]
    );
}

#[test]
fn consecutive_cuts_each_produce_a_pair() {
    let events = run_flags(&[true, false, true, false]);
    assert_eq!(
        summary(&events),
        vec![
            ("shot_begin", 1),
            ("shot_end", 2),
            ("shot_begin", 3),
            ("shot_end", 4),
            ("shot_begin", 5),
            ("shot_end", 5)
        ]
    );
}

// ── end of stream ──────────────────────────────────────────────────

#[test]
fn single_frame_stream() {
    let events = run_flags(&[]);
    assert_eq!(summary(&events), vec![("shot_begin", 1), ("shot_end", 1)]);
}

#[test]
fn end_of_stream_inside_transition() {
    let events = run_flags(&[false, true, true]);
    assert_eq!(
        summary(&events),
        vec![
            ("shot_begin", 1),
            ("shot_end", 3),
            ("shot_begin", 4),
            ("shot_end", 4)
        ]
    );
}

#[test]
fn finish_closes_the_tracker() {
    let (mut tracker, _) = ShotTracker::start(1, Duration::ZERO);
    assert_eq!(tracker.finish(1, Duration::ZERO).len(), 1);
    assert!(tracker.is_closed());
    assert!(tracker.finish(2, Duration::ZERO).is_empty());
    assert!(tracker.observe(true, 3, Duration::ZERO).is_none());
}

// ── abort ──────────────────────────────────────────────────────────

#[test]
fn abort_within_shot_emits_single_marker() {
    let (mut tracker, _) = ShotTracker::start(1, Duration::ZERO);
    tracker.observe(false, 2, Duration::from_millis(40));

    let event = tracker.abort(2, Duration::from_millis(40));
    assert_eq!(
        event,
        Some(ShotEvent::Aborted {
            frame: 2,
            timestamp: Duration::from_millis(40)
        })
    );
    assert_eq!(tracker.state(), TrackerState::Closed);
    assert!(tracker.abort(3, Duration::ZERO).is_none());
    assert!(tracker.finish(3, Duration::ZERO).is_empty());
}

#[test]
fn abort_inside_transition_does_not_synthesize_begin() {
    let (mut tracker, _) = ShotTracker::start(1, Duration::ZERO);
    tracker.observe(true, 2, Duration::ZERO);
    assert_eq!(tracker.state(), TrackerState::InTransition);

    let event = tracker.abort(2, Duration::ZERO);
    assert!(matches!(event, Some(ShotEvent::Aborted { frame: 2, .. })));
    assert!(tracker.observe(false, 3, Duration::ZERO).is_none());
}

// ── state machine ──────────────────────────────────────────────────

#[test]
fn state_transition_table() {
    let begin = FrameMark::new(1, Duration::ZERO);
    let mark = FrameMark::new(5, Duration::from_secs(1));
    let within = TrackerState::WithinShot { begin };

    assert_eq!(within.next(false, mark), (within, None));
    assert!(matches!(
        within.next(true, mark),
        (TrackerState::InTransition, Some(ShotEvent::ShotEnd { frame: 5, .. }))
    ));
    assert_eq!(
        TrackerState::InTransition.next(true, mark),
        (TrackerState::InTransition, None)
    );
    assert_eq!(
        TrackerState::InTransition.next(false, mark),
        (
            TrackerState::WithinShot { begin: mark },
            Some(ShotEvent::ShotBegin {
                frame: 5,
                timestamp: Duration::from_secs(1)
            })
        )
    );
    assert_eq!(TrackerState::Closed.next(true, mark), (TrackerState::Closed, None));
}

// ── shot log ───────────────────────────────────────────────────────

#[test]
fn shot_log_folds_events_into_shots() {
    let events = run_flags(&[false, true, false, false]);
    let mut log = ShotLog::new();
    for event in &events {
        log.record(event).unwrap();
    }

    let shots = log.finish().unwrap();
    assert_eq!(shots.len(), 2);
    assert_eq!(shots[0].begin.frame, 1);
    assert_eq!(shots[0].end.frame, 3);
    assert_eq!(shots[0].frame_span(), 2);
    assert_eq!(shots[0].duration(), Duration::from_millis(80));
    assert!(!shots[1].aborted);
}

#[test]
fn shot_log_records_aborted_shot() {
    let mut log = ShotLog::new();
    log.record(&ShotEvent::ShotBegin {
        frame: 1,
        timestamp: Duration::ZERO,
    })
    .unwrap();
    let shot = log
        .record(&ShotEvent::Aborted {
            frame: 9,
            timestamp: Duration::from_secs(1),
        })
        .unwrap()
        .expect("abort closes the open shot");

    assert!(shot.aborted);
    assert_eq!(shot.end.frame, 9);
    assert!(log.is_aborted());
    assert_eq!(log.finish().unwrap().len(), 1);
}

#[test]
fn shot_log_rejects_unterminated_shot() {
    let mut log = ShotLog::new();
    log.record(&ShotEvent::ShotBegin {
        frame: 1,
        timestamp: Duration::ZERO,
    })
    .unwrap();
    assert_eq!(log.open_shot().map(|mark| mark.frame), Some(1));

    let reopened = log.record(&ShotEvent::ShotBegin {
        frame: 2,
        timestamp: Duration::ZERO,
    });
    assert!(matches!(reopened, Err(ShotDetectError::UnterminatedShot(_))));

    assert!(matches!(log.finish(), Err(ShotDetectError::UnterminatedShot(_))));
}

#[test]
fn shot_log_rejects_end_without_begin() {
    let mut log = ShotLog::new();
    let result = log.record(&ShotEvent::ShotEnd {
        frame: 4,
        timestamp: Duration::ZERO,
    });
    assert!(matches!(result, Err(ShotDetectError::UnterminatedShot(_))));
}

#[test]
fn shot_log_rejects_shots_after_abort() {
    let mut log = ShotLog::new();
    log.record(&ShotEvent::Aborted {
        frame: 1,
        timestamp: Duration::ZERO,
    })
    .unwrap();
    assert!(log
        .record(&ShotEvent::Sampled {
            frame: 1,
            timestamp: Duration::ZERO
        })
        .is_ok());
    assert!(log
        .record(&ShotEvent::ShotBegin {
            frame: 2,
            timestamp: Duration::ZERO
        })
        .is_err());
}
