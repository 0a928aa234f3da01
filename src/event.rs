//! Detection events and the sink trait that receives them.
//!
//! [`ShotEvent`] is the only observable output of detection. Events are
//! handed to an [`EventSink`] one at a time, in emission order, together with
//! the frame they refer to.

use std::time::Duration;

use crate::{error::ShotDetectError, frame::Frame};

/// One detection event.
///
/// `frame` is the source position of the frame the event refers to (the
/// first frame of a stream is at position 1); `timestamp` is its
/// presentation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShotEvent {
    /// A new shot opens at this frame.
    ShotBegin {
        /// Frame position.
        frame: u64,
        /// Presentation timestamp.
        timestamp: Duration,
    },
    /// The open shot closes at this frame.
    ShotEnd {
        /// Frame position.
        frame: u64,
        /// Presentation timestamp.
        timestamp: Duration,
    },
    /// The periodic sampler fired at this frame.
    Sampled {
        /// Frame position.
        frame: u64,
        /// Presentation timestamp.
        timestamp: Duration,
    },
    /// Detection was stopped on request at this frame.
    Aborted {
        /// Frame position.
        frame: u64,
        /// Presentation timestamp.
        timestamp: Duration,
    },
}

impl ShotEvent {
    /// Frame position the event refers to.
    pub fn frame(&self) -> u64 {
        match *self {
            ShotEvent::ShotBegin { frame, .. }
            | ShotEvent::ShotEnd { frame, .. }
            | ShotEvent::Sampled { frame, .. }
            | ShotEvent::Aborted { frame, .. } => frame,
        }
    }

    /// Presentation timestamp the event refers to.
    pub fn timestamp(&self) -> Duration {
        match *self {
            ShotEvent::ShotBegin { timestamp, .. }
            | ShotEvent::ShotEnd { timestamp, .. }
            | ShotEvent::Sampled { timestamp, .. }
            | ShotEvent::Aborted { timestamp, .. } => timestamp,
        }
    }

    /// Snake-case record name (`shot_begin`, `shot_end`, `sampled`, `aborted`).
    pub fn kind(&self) -> &'static str {
        match self {
            ShotEvent::ShotBegin { .. } => "shot_begin",
            ShotEvent::ShotEnd { .. } => "shot_end",
            ShotEvent::Sampled { .. } => "sampled",
            ShotEvent::Aborted { .. } => "aborted",
        }
    }
}

/// Receiver of detection events.
///
/// Sinks are called synchronously from the detection loop; an error aborts
/// detection and is returned to the caller.
///
/// Implementations are provided for `Vec<ShotEvent>` (collects events),
/// `&mut S`, `Option<S>` (`None` discards), and `(A, B)` (forwards to `A`,
/// then `B`).
pub trait EventSink {
    /// Handle one event. `frame` is the raster the event refers to.
    fn on_event(&mut self, event: &ShotEvent, frame: &Frame) -> Result<(), ShotDetectError>;
}

impl EventSink for Vec<ShotEvent> {
    fn on_event(&mut self, event: &ShotEvent, _frame: &Frame) -> Result<(), ShotDetectError> {
        self.push(*event);
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn on_event(&mut self, event: &ShotEvent, frame: &Frame) -> Result<(), ShotDetectError> {
        (**self).on_event(event, frame)
    }
}

impl<S: EventSink> EventSink for Option<S> {
    fn on_event(&mut self, event: &ShotEvent, frame: &Frame) -> Result<(), ShotDetectError> {
        match self {
            Some(sink) => sink.on_event(event, frame),
            None => Ok(()),
        }
    }
}

impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn on_event(&mut self, event: &ShotEvent, frame: &Frame) -> Result<(), ShotDetectError> {
        self.0.on_event(event, frame)?;
        self.1.on_event(event, frame)
    }
}
