//! Detection configuration.
//!
//! [`DetectionOptions`] is a builder that carries the algorithm settings
//! (threshold, sampling period, histogram resolution) together with the
//! operational ones (progress callback, cancellation, stop limits) so that
//! [`ShotDetector`](crate::ShotDetector) has a single argument to thread
//! through.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use shotdetect::{CancellationToken, DetectionOptions, ProgressCallback, ProgressInfo};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{} frame(s) done", info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = DetectionOptions::new()
//!     .with_threshold(0.6)
//!     .with_sample_period(250)
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_batch_size(50);
//!
//! assert_eq!(options.threshold(), 0.6);
//! assert_eq!(options.sample_period(), 250);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

use crate::{
    boundary::DEFAULT_THRESHOLD,
    error::ShotDetectError,
    histogram::DEFAULT_BINS_PER_CHANNEL,
    progress::{CancellationToken, NoOpProgress, ProgressCallback},
};

/// Configuration for a detection run.
///
/// Defaults: threshold `0.49`, sampling disabled, 32 bins per channel, no
/// progress callback, no cancellation, no stop limits.
#[derive(Clone)]
pub struct DetectionOptions {
    /// Chi-square distance above which a frame pair is a boundary.
    pub(crate) threshold: f64,
    /// Emit a sample every N frames; 0 disables sampling.
    pub(crate) sample_period: u64,
    /// Histogram bins along each color axis.
    pub(crate) bins_per_channel: usize,
    /// Progress callback. Defaults to a no-op.
    pub(crate) progress: Arc<dyn ProgressCallback>,
    /// Cancellation token. `None` means never cancelled.
    pub(crate) cancellation: Option<CancellationToken>,
    /// How often to fire the progress callback (every N frames).
    pub(crate) batch_size: u64,
    /// Stop (through the abort path) once this many frames are processed.
    pub(crate) max_frames: Option<u64>,
    /// Stop (through the abort path) once a frame at or past this timestamp
    /// is processed.
    pub(crate) max_duration: Option<Duration>,
}

impl Debug for DetectionOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DetectionOptions")
            .field("threshold", &self.threshold)
            .field("sample_period", &self.sample_period)
            .field("bins_per_channel", &self.bins_per_channel)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("max_frames", &self.max_frames)
            .field("max_duration", &self.max_duration)
            .finish()
    }
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            sample_period: 0,
            bins_per_channel: DEFAULT_BINS_PER_CHANNEL,
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            max_frames: None,
            max_duration: None,
        }
    }

    /// Set the chi-square boundary threshold.
    ///
    /// Lower values detect more (weaker) transitions.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Emit a [`Sampled`](crate::ShotEvent::Sampled) event every `period`
    /// frames. Zero disables sampling.
    #[must_use]
    pub fn with_sample_period(mut self, period: u64) -> Self {
        self.sample_period = period;
        self
    }

    /// Set the histogram resolution (bins along each color axis, 1–256).
    #[must_use]
    pub fn with_bins_per_channel(mut self, bins: usize) -> Self {
        self.bins_per_channel = bins;
        self
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled the run stops at the next frame and
    /// emits an [`Aborted`](crate::ShotEvent::Aborted) marker. A source that
    /// has no next frame finishes normally instead.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires. Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Stop after `frames` frames have been processed.
    ///
    /// The run is reported as aborted only if the source has more frames; a
    /// stream of exactly `frames` frames ends with a normal shot end.
    #[must_use]
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Stop once a frame at or past `duration` has been processed.
    #[must_use]
    pub fn with_max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }

    /// Chi-square boundary threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Sampling period (0 when disabled).
    pub fn sample_period(&self) -> u64 {
        self.sample_period
    }

    /// Histogram bins along each color axis.
    pub fn bins_per_channel(&self) -> usize {
        self.bins_per_channel
    }

    /// Check the settings before a run.
    ///
    /// # Errors
    ///
    /// Returns [`ShotDetectError::InvalidConfiguration`] for a non-finite
    /// threshold, a bin count outside `1..=256`, or a zero frame limit.
    pub fn validate(&self) -> Result<(), ShotDetectError> {
        if !self.threshold.is_finite() {
            return Err(ShotDetectError::InvalidConfiguration(format!(
                "threshold must be a finite number, got {}",
                self.threshold
            )));
        }
        if self.bins_per_channel == 0 || self.bins_per_channel > 256 {
            return Err(ShotDetectError::InvalidConfiguration(format!(
                "bins per channel must be between 1 and 256, got {}",
                self.bins_per_channel
            )));
        }
        if self.max_frames == Some(0) {
            return Err(ShotDetectError::InvalidConfiguration(
                "frame limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the run should stop after the frame at `processed` frames and
    /// `timestamp`.
    pub(crate) fn should_stop(&self, processed: u64, timestamp: Duration) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
            || self.max_frames.is_some_and(|limit| processed >= limit)
            || self.max_duration.is_some_and(|limit| timestamp >= limit)
    }
}
