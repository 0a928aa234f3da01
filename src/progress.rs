//! Progress reporting and cooperative cancellation.
//!
//! This module provides [`ProgressCallback`] for monitoring a detection run,
//! [`ProgressInfo`] for progress snapshots, and [`CancellationToken`] for
//! requesting that a run stop early.
//!
//! Cancellation is not an error: a cancelled run ends through the abort path
//! and emits a [`ShotEvent::Aborted`](crate::ShotEvent::Aborted) marker.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shotdetect::{
//!     DetectionOptions, ProgressCallback, ProgressInfo, ShotDetectError, ShotDetector,
//!     ShotEvent, VideoSource,
//! };
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% complete, {} shot(s) so far", info.shots_detected);
//!         }
//!     }
//! }
//!
//! let mut source = VideoSource::open("input.mp4")?;
//! let options = DetectionOptions::new()
//!     .with_progress(Arc::new(PrintProgress))
//!     .with_batch_size(100);
//!
//! let mut events: Vec<ShotEvent> = Vec::new();
//! ShotDetector::new(options).run(&mut source, &mut events)?;
//! # Ok::<(), ShotDetectError>(())
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// A snapshot of detection progress.
///
/// Delivered to [`ProgressCallback::on_progress`] every
/// [`batch_size`](crate::DetectionOptions::with_batch_size) frames and once
/// when the run ends.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// How many frames have been processed so far.
    pub current: u64,
    /// Total frames expected, if the source reports a frame count.
    pub total: Option<u64>,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the run started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// Shots closed so far.
    pub shots_detected: u64,
    /// Position of the frame most recently processed.
    pub current_frame: Option<u64>,
    /// Timestamp of the frame most recently processed.
    pub current_timestamp: Option<Duration>,
}

/// Trait for receiving progress updates during detection.
///
/// Implementations must be [`Send`] and [`Sync`] so that a single callback
/// can be shared with a UI thread.
///
/// Progress callbacks are **infallible**: they observe but cannot halt the
/// run. Use [`CancellationToken`] to stop it.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during a detection run.
    fn on_progress(&self, info: &ProgressInfo);
}

/// Discards all progress notifications. Used when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to ask the
/// associated run to stop. The detection loop checks
/// [`is_cancelled`](CancellationToken::is_cancelled) once per frame.
///
/// # Example
///
/// ```
/// use shotdetect::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.clone().cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token observe the request.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks run timing and fires the callback every `batch_size` frames.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: Option<u64>,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    frames_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: Option<u64>, batch_size: u64) -> Self {
        Self {
            callback,
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            frames_since_last_report: 0,
        }
    }

    /// Record one processed frame and report if the batch is full.
    pub(crate) fn advance(&mut self, frame: u64, timestamp: Duration, shots_detected: u64) {
        self.current += 1;
        self.frames_since_last_report += 1;

        if self.frames_since_last_report >= self.batch_size {
            self.report(Some(frame), Some(timestamp), shots_detected);
            self.frames_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final report.
    pub(crate) fn finish(&mut self, shots_detected: u64) {
        self.report(None, None, shots_detected);
    }

    fn report(&self, frame: Option<u64>, timestamp: Option<Duration>, shots_detected: u64) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&total| total > 0)
            .map(|total| (self.current as f32 / total as f32 * 100.0).min(100.0));

        let estimated_remaining = if self.current > 0 {
            self.total.map(|total| {
                let remaining = total.saturating_sub(self.current);
                elapsed.mul_f64(remaining as f64 / self.current as f64)
            })
        } else {
            None
        };

        let info = ProgressInfo {
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            shots_detected,
            current_frame: frame,
            current_timestamp: timestamp,
        };

        self.callback.on_progress(&info);
    }
}
