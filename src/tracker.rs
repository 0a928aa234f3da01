//! Shot segmentation state machine.
//!
//! [`ShotTracker`] turns the per-frame boundary flag into
//! [`ShotEvent::ShotBegin`] / [`ShotEvent::ShotEnd`] events. A transition is
//! one or more consecutive boundary frame pairs: a hard cut is a transition
//! of length one, a fade or dissolve spans several. Only the first boundary
//! of a transition closes the open shot and only the first stable frame
//! after it opens the next one, so the frames in between are absorbed into
//! the transition instead of each being reported as a shot.
//!
//! [`ShotLog`] is the matching consumer: it folds an event stream into
//! [`Shot`] records and rejects streams that leave a shot open.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use shotdetect::{ShotEvent, ShotTracker};
//!
//! let at = |ms| Duration::from_millis(ms);
//! let (mut tracker, begin) = ShotTracker::start(1, at(0));
//! assert_eq!(begin, ShotEvent::ShotBegin { frame: 1, timestamp: at(0) });
//!
//! // A three-frame fade produces one end and one begin.
//! assert!(tracker.observe(false, 2, at(40)).is_none());
//! assert!(matches!(tracker.observe(true, 3, at(80)), Some(ShotEvent::ShotEnd { frame: 3, .. })));
//! assert!(tracker.observe(true, 4, at(120)).is_none());
//! assert!(tracker.observe(true, 5, at(160)).is_none());
//! assert!(matches!(tracker.observe(false, 6, at(200)), Some(ShotEvent::ShotBegin { frame: 6, .. })));
//! ```

use std::time::Duration;

use crate::{error::ShotDetectError, event::EventSink, event::ShotEvent, frame::Frame};

/// A frame position paired with its presentation timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameMark {
    /// Frame position.
    pub frame: u64,
    /// Presentation timestamp.
    pub timestamp: Duration,
}

impl FrameMark {
    /// Create a mark.
    pub fn new(frame: u64, timestamp: Duration) -> Self {
        Self { frame, timestamp }
    }
}

/// State of a [`ShotTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Content is stable; the shot that began at `begin` is open.
    WithinShot {
        /// Where the open shot began.
        begin: FrameMark,
    },
    /// A boundary condition holds across consecutive frame pairs.
    InTransition,
    /// The stream was finalized or aborted; no further events are produced.
    Closed,
}

impl TrackerState {
    /// Apply one frame's boundary flag.
    ///
    /// Returns the next state and the event the transition emits, if any.
    pub fn next(self, boundary: bool, mark: FrameMark) -> (TrackerState, Option<ShotEvent>) {
        match (self, boundary) {
            (TrackerState::WithinShot { .. }, true) => (
                TrackerState::InTransition,
                Some(ShotEvent::ShotEnd {
                    frame: mark.frame,
                    timestamp: mark.timestamp,
                }),
            ),
            (TrackerState::WithinShot { begin }, false) => {
                (TrackerState::WithinShot { begin }, None)
            }
            (TrackerState::InTransition, true) => (TrackerState::InTransition, None),
            (TrackerState::InTransition, false) => (
                TrackerState::WithinShot { begin: mark },
                Some(ShotEvent::ShotBegin {
                    frame: mark.frame,
                    timestamp: mark.timestamp,
                }),
            ),
            (TrackerState::Closed, _) => (TrackerState::Closed, None),
        }
    }
}

/// Two-state shot tracker with explicit end-of-stream and abort handling.
#[derive(Debug, Clone)]
pub struct ShotTracker {
    state: TrackerState,
}

impl ShotTracker {
    /// Start tracking at the first frame of a stream.
    ///
    /// The first frame implicitly opens a shot; the returned
    /// [`ShotEvent::ShotBegin`] records it.
    pub fn start(frame: u64, timestamp: Duration) -> (Self, ShotEvent) {
        let begin = FrameMark::new(frame, timestamp);
        (
            Self {
                state: TrackerState::WithinShot { begin },
            },
            ShotEvent::ShotBegin { frame, timestamp },
        )
    }

    /// Current state.
    pub fn state(&self) -> TrackerState {
        self.state
    }

    /// Whether the tracker has been finalized or aborted.
    pub fn is_closed(&self) -> bool {
        self.state == TrackerState::Closed
    }

    /// Feed the boundary flag between this frame and the previous one.
    ///
    /// Observing after [`finish`](Self::finish) or [`abort`](Self::abort) is a
    /// caller bug; it is logged and ignored.
    pub fn observe(&mut self, boundary: bool, frame: u64, timestamp: Duration) -> Option<ShotEvent> {
        if self.is_closed() {
            log::warn!("Frame {frame} observed after the shot tracker was closed");
            return None;
        }

        let (state, event) = self.state.next(boundary, FrameMark::new(frame, timestamp));
        self.state = state;
        event
    }

    /// Finalize at end of stream, given the last frame seen.
    ///
    /// Within a shot, the open shot is closed at the last frame. Inside a
    /// transition, end of stream counts as stabilization: a final shot is
    /// opened and closed at the last frame, so the output never ends inside
    /// a transition. Finalizing a closed tracker emits nothing.
    pub fn finish(&mut self, frame: u64, timestamp: Duration) -> Vec<ShotEvent> {
        let events = match self.state {
            TrackerState::WithinShot { .. } => vec![ShotEvent::ShotEnd { frame, timestamp }],
            TrackerState::InTransition => vec![
                ShotEvent::ShotBegin { frame, timestamp },
                ShotEvent::ShotEnd { frame, timestamp },
            ],
            TrackerState::Closed => Vec::new(),
        };
        self.state = TrackerState::Closed;
        events
    }

    /// Stop on request at the given frame.
    ///
    /// Emits a single [`ShotEvent::Aborted`]. An open shot is closed by the
    /// abort marker; inside a transition the marker takes the place of the
    /// next shot's begin. No begin is synthesized afterwards. Returns `None`
    /// if the tracker was already closed.
    pub fn abort(&mut self, frame: u64, timestamp: Duration) -> Option<ShotEvent> {
        if self.is_closed() {
            return None;
        }
        self.state = TrackerState::Closed;
        Some(ShotEvent::Aborted { frame, timestamp })
    }
}

/// A closed shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shot {
    /// Where the shot began.
    pub begin: FrameMark,
    /// Where the shot ended (or was aborted).
    pub end: FrameMark,
    /// `true` when the shot was closed by an abort marker.
    pub aborted: bool,
}

impl Shot {
    /// Time between the begin and end marks.
    pub fn duration(&self) -> Duration {
        self.end.timestamp.saturating_sub(self.begin.timestamp)
    }

    /// Number of frame positions between the begin and end marks.
    pub fn frame_span(&self) -> u64 {
        self.end.frame.saturating_sub(self.begin.frame)
    }
}

/// Folds an event stream into [`Shot`] records and checks its structure.
///
/// Every `ShotBegin` must be followed by a `ShotEnd` or an `Aborted` marker
/// before the next `ShotBegin`, and no shot may remain open at
/// [`finish`](ShotLog::finish). `Sampled` events are ignored.
#[derive(Debug, Clone, Default)]
pub struct ShotLog {
    open: Option<FrameMark>,
    shots: Vec<Shot>,
    aborted: bool,
}

impl ShotLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one event.
    ///
    /// Returns the shot the event closed, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ShotDetectError::UnterminatedShot`] for a begin while a shot
    /// is open, an end with no open shot, or any shot event after an abort.
    pub fn record(&mut self, event: &ShotEvent) -> Result<Option<Shot>, ShotDetectError> {
        if self.aborted && !matches!(event, ShotEvent::Sampled { .. }) {
            return Err(ShotDetectError::UnterminatedShot(format!(
                "{} at frame {} after the stream was aborted",
                event.kind(),
                event.frame()
            )));
        }

        let mark = FrameMark::new(event.frame(), event.timestamp());
        match event {
            ShotEvent::ShotBegin { .. } => {
                if let Some(open) = self.open {
                    return Err(ShotDetectError::UnterminatedShot(format!(
                        "shot opened at frame {} is still open when another opens at frame {}",
                        open.frame, mark.frame
                    )));
                }
                self.open = Some(mark);
                Ok(None)
            }
            ShotEvent::ShotEnd { .. } => {
                let begin = self.open.take().ok_or_else(|| {
                    ShotDetectError::UnterminatedShot(format!(
                        "shot end at frame {} without an open shot",
                        mark.frame
                    ))
                })?;
                Ok(Some(self.close(begin, mark, false)))
            }
            ShotEvent::Aborted { .. } => {
                self.aborted = true;
                Ok(self
                    .open
                    .take()
                    .map(|begin| self.close(begin, mark, true)))
            }
            ShotEvent::Sampled { .. } => Ok(None),
        }
    }

    fn close(&mut self, begin: FrameMark, end: FrameMark, aborted: bool) -> Shot {
        let shot = Shot {
            begin,
            end,
            aborted,
        };
        self.shots.push(shot);
        shot
    }

    /// Shots closed so far.
    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    /// The begin mark of the currently open shot, if any.
    pub fn open_shot(&self) -> Option<FrameMark> {
        self.open
    }

    /// Whether an abort marker has been recorded.
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Finish the log and return every closed shot.
    ///
    /// # Errors
    ///
    /// Returns [`ShotDetectError::UnterminatedShot`] if a shot is still open.
    pub fn finish(self) -> Result<Vec<Shot>, ShotDetectError> {
        match self.open {
            Some(open) => Err(ShotDetectError::UnterminatedShot(format!(
                "shot opened at frame {} was never closed",
                open.frame
            ))),
            None => Ok(self.shots),
        }
    }
}

impl EventSink for ShotLog {
    fn on_event(&mut self, event: &ShotEvent, _frame: &Frame) -> Result<(), ShotDetectError> {
        self.record(event).map(|_| ())
    }
}
