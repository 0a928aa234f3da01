//! Stream driver.
//!
//! [`ShotDetector`] pulls frames from a [`FrameSource`], compares each
//! frame's color histogram with the previous one, and pushes the resulting
//! [`ShotEvent`]s into an [`EventSink`] as they happen.
//!
//! # Example
//!
//! ```
//! use shotdetect::{DetectionOptions, Frame, MemorySource, ShotDetector, ShotEvent};
//!
//! let red = Frame::filled(8, 8, [255, 0, 0]);
//! let blue = Frame::filled(8, 8, [0, 0, 255]);
//! let mut source = MemorySource::at_frame_rate(
//!     vec![red.clone(), red, blue.clone(), blue],
//!     25.0,
//! );
//!
//! let mut events: Vec<ShotEvent> = Vec::new();
//! let summary = ShotDetector::new(DetectionOptions::new()).run(&mut source, &mut events)?;
//!
//! assert_eq!(summary.frames_processed, 4);
//! assert_eq!(summary.shots.len(), 2);
//! let frames: Vec<(&str, u64)> = events.iter().map(|e| (e.kind(), e.frame())).collect();
//! assert_eq!(
//!     frames,
//!     vec![("shot_begin", 1), ("shot_end", 3), ("shot_begin", 4), ("shot_end", 4)]
//! );
//! # Ok::<(), shotdetect::ShotDetectError>(())
//! ```

use std::time::Duration;

use crate::{
    boundary::is_boundary,
    configuration::DetectionOptions,
    distance::DistanceMethod,
    error::ShotDetectError,
    event::{EventSink, ShotEvent},
    frame::{Frame, FrameSource},
    histogram::ColorHistogram,
    progress::ProgressTracker,
    sampler::FrameSampler,
    tracker::{Shot, ShotLog, ShotTracker},
};

/// Outcome of a detection run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionSummary {
    /// Frames pulled from the source and analysed.
    pub frames_processed: u64,
    /// Every shot closed during the run, in order.
    pub shots: Vec<Shot>,
    /// Number of `Sampled` events emitted.
    pub samples: u64,
    /// Whether the run ended through the abort path.
    pub aborted: bool,
}

/// Histogram-based shot boundary detector.
#[derive(Debug, Clone, Default)]
pub struct ShotDetector {
    options: DetectionOptions,
}

/// The previously processed frame, carried into the next comparison.
struct Carried {
    frame: Frame,
    histogram: ColorHistogram,
    position: u64,
    timestamp: Duration,
}

/// Forwards events to the caller's sink while keeping the shot log and
/// sample count used for the summary.
struct Emitter<'a, K: EventSink + ?Sized> {
    sink: &'a mut K,
    log: ShotLog,
    samples: u64,
}

impl<K: EventSink + ?Sized> Emitter<'_, K> {
    fn emit(&mut self, event: ShotEvent, frame: &Frame) -> Result<(), ShotDetectError> {
        log::debug!(
            "{} at frame {} ({:?})",
            event.kind(),
            event.frame(),
            event.timestamp()
        );
        if matches!(event, ShotEvent::Sampled { .. }) {
            self.samples += 1;
        }
        self.log.record(&event)?;
        self.sink.on_event(&event, frame)
    }

    fn shots_detected(&self) -> u64 {
        self.log.shots().len() as u64
    }
}

impl ShotDetector {
    /// Create a detector with the given options.
    pub fn new(options: DetectionOptions) -> Self {
        Self { options }
    }

    /// Options this detector runs with.
    pub fn options(&self) -> &DetectionOptions {
        &self.options
    }

    /// Run detection over `source`, sending every event to `sink`.
    ///
    /// An empty source produces no events and an empty summary. A stop
    /// request (cancellation token or a frame/duration limit) ends the run
    /// with a single [`ShotEvent::Aborted`] at the last processed frame and is
    /// not an error. If the source has no frames left when the stop is seen,
    /// the run finishes normally instead.
    ///
    /// # Errors
    ///
    /// Returns [`ShotDetectError::InvalidConfiguration`] for invalid options,
    /// and propagates errors from the source, the histogram extractor, and
    /// the sink. Events already delivered to the sink stay delivered.
    pub fn run<S, K>(&self, source: &mut S, sink: &mut K) -> Result<DetectionSummary, ShotDetectError>
    where
        S: FrameSource + ?Sized,
        K: EventSink + ?Sized,
    {
        self.options.validate()?;
        let bins = self.options.bins_per_channel;

        log::debug!(
            "Starting shot detection (threshold {}, sample period {}, {} bins per channel)",
            self.options.threshold,
            self.options.sample_period,
            bins,
        );

        let total = source
            .info()
            .map(|info| info.frame_count)
            .filter(|&count| count > 0)
            .map(|count| match self.options.max_frames {
                Some(limit) => count.min(limit),
                None => count,
            });
        let mut progress =
            ProgressTracker::new(self.options.progress.clone(), total, self.options.batch_size);

        let mut emitter = Emitter {
            sink,
            log: ShotLog::new(),
            samples: 0,
        };
        let mut sampler = FrameSampler::new(self.options.sample_period);

        let Some(first) = source.next_frame()? else {
            log::debug!("Frame source is empty; nothing to detect");
            progress.finish(0);
            return Ok(DetectionSummary::default());
        };

        let mut carried = Carried {
            histogram: ColorHistogram::extract(&first, bins)?,
            frame: first,
            position: source.position(),
            timestamp: source.timestamp(),
        };
        let mut frames_processed = 1_u64;

        let (mut tracker, begin) = ShotTracker::start(carried.position, carried.timestamp);
        emitter.emit(begin, &carried.frame)?;
        if let Some(sample) = sampler.tick(carried.position, carried.timestamp) {
            emitter.emit(sample, &carried.frame)?;
        }
        progress.advance(carried.position, carried.timestamp, emitter.shots_detected());

        let mut aborted = false;
        loop {
            let stop_requested = self.options.should_stop(frames_processed, carried.timestamp);

            let Some(frame) = source.next_frame()? else {
                for event in tracker.finish(carried.position, carried.timestamp) {
                    emitter.emit(event, &carried.frame)?;
                }
                break;
            };

            // A stop only aborts when the source still had frames to give.
            if stop_requested {
                log::debug!(
                    "Stop requested after {} frame(s); aborting at frame {}",
                    frames_processed,
                    carried.position
                );
                if let Some(event) = tracker.abort(carried.position, carried.timestamp) {
                    emitter.emit(event, &carried.frame)?;
                }
                aborted = true;
                break;
            }

            let position = source.position();
            let timestamp = source.timestamp();
            let histogram = ColorHistogram::extract(&frame, bins)?;
            let distance = carried
                .histogram
                .distance(&histogram, DistanceMethod::ChiSquare)?;
            let boundary = is_boundary(distance, self.options.threshold);
            frames_processed += 1;

            log::trace!("Frame {position}: chi-square {distance:.6}, boundary {boundary}");

            if let Some(event) = tracker.observe(boundary, position, timestamp) {
                emitter.emit(event, &frame)?;
            }
            if let Some(sample) = sampler.tick(position, timestamp) {
                emitter.emit(sample, &frame)?;
            }
            progress.advance(position, timestamp, emitter.shots_detected());

            carried = Carried {
                frame,
                histogram,
                position,
                timestamp,
            };
        }

        let samples = emitter.samples;
        let shots = emitter.log.finish()?;
        progress.finish(shots.len() as u64);

        log::debug!(
            "Shot detection finished: {} frame(s), {} shot(s), {} sample(s){}",
            frames_processed,
            shots.len(),
            samples,
            if aborted { ", aborted" } else { "" },
        );

        Ok(DetectionSummary {
            frames_processed,
            shots,
            samples,
            aborted,
        })
    }
}
