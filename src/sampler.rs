//! Periodic frame sampling.

use std::time::Duration;

use crate::event::ShotEvent;

/// Fixed-period frame counter, independent of shot tracking.
///
/// Counts every processed frame (including the first of the stream) and
/// emits [`ShotEvent::Sampled`] each time the count reaches the period. A
/// period of zero disables sampling.
///
/// ```
/// use std::time::Duration;
///
/// use shotdetect::FrameSampler;
///
/// let mut sampler = FrameSampler::new(3);
/// let fired: Vec<u64> = (1..=10)
///     .filter_map(|frame| sampler.tick(frame, Duration::ZERO))
///     .map(|event| event.frame())
///     .collect();
/// assert_eq!(fired, vec![3, 6, 9]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FrameSampler {
    period: u64,
    counter: u64,
}

impl FrameSampler {
    /// Create a sampler that fires every `period` frames.
    pub fn new(period: u64) -> Self {
        Self { period, counter: 0 }
    }

    /// Configured period (0 when disabled).
    pub fn period(&self) -> u64 {
        self.period
    }

    /// Whether the sampler can ever fire.
    pub fn is_enabled(&self) -> bool {
        self.period != 0
    }

    /// Count one processed frame.
    pub fn tick(&mut self, frame: u64, timestamp: Duration) -> Option<ShotEvent> {
        if !self.is_enabled() {
            return None;
        }

        self.counter += 1;
        if self.counter < self.period {
            return None;
        }

        self.counter = 0;
        Some(ShotEvent::Sampled { frame, timestamp })
    }
}
