//! # shotdetect
//!
//! Detect shot boundaries in video by comparing the color content of
//! consecutive frames.
//!
//! Each decoded frame is reduced to a joint RGB histogram; the chi-square
//! distance between the histograms of neighbouring frames is compared with a
//! threshold, and a small state machine turns the resulting boundary flags
//! into shot begin and end events. Hard cuts and gradual transitions (fades,
//! dissolves) each produce exactly one end and one begin. Video decoding is
//! powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Detect Shots in a Video
//!
//! ```no_run
//! use shotdetect::{DetectionOptions, ShotDetector, ShotEvent, VideoSource};
//!
//! let mut source = VideoSource::open_with_resolution("input.mp4", Some(320), None).unwrap();
//! let mut events: Vec<ShotEvent> = Vec::new();
//!
//! let summary = ShotDetector::new(DetectionOptions::new())
//!     .run(&mut source, &mut events)
//!     .unwrap();
//!
//! for shot in &summary.shots {
//!     println!("shot: frames {} to {}", shot.begin.frame, shot.end.frame);
//! }
//! ```
//!
//! ### Write a Report While Detecting
//!
//! ```no_run
//! use shotdetect::{
//!     DetectionOptions, FrameSaver, ReportFormat, ReportWriter, ShotDetector, VideoSource,
//! };
//!
//! let mut source = VideoSource::open("input.mp4").unwrap();
//! let mut report = ReportWriter::create("result", ReportFormat::Xml).unwrap();
//! report.write_header(source.video_info()).unwrap();
//!
//! let saver = FrameSaver::new("shots", "png").unwrap();
//! let options = DetectionOptions::new().with_threshold(0.6).with_sample_period(250);
//!
//! let mut sinks = (&mut report, saver);
//! ShotDetector::new(options).run(&mut source, &mut sinks).unwrap();
//! report.finish().unwrap();
//! ```
//!
//! ### Compare Two Images
//!
//! ```no_run
//! use shotdetect::{ColorHistogram, DistanceMethod, Frame};
//!
//! let a = Frame::from(image::open("a.png").unwrap().to_rgb8());
//! let b = Frame::from(image::open("b.png").unwrap().to_rgb8());
//!
//! let ha = ColorHistogram::extract(&a, 32).unwrap();
//! let hb = ColorHistogram::extract(&b, 32).unwrap();
//! println!("{}", ha.distance(&hb, DistanceMethod::ChiSquare).unwrap());
//! ```
//!
//! ## Features
//!
//! - **Joint color histograms** with configurable resolution
//! - **Four distance metrics**: chi-square, correlation, intersection,
//!   Bhattacharyya
//! - **Transition-aware segmentation** with explicit end-of-stream and abort
//!   handling
//! - **Periodic sampling** independent of shot boundaries
//! - **Streaming reports** in XML, text, or JSON Lines
//! - **Frame snapshots** of every boundary and sample
//! - **Progress & cancellation**: cooperative callbacks, a
//!   `CancellationToken`, and frame or duration limits
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | Parallel histogram accumulation across rayon threads |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod boundary;
pub mod configuration;
pub mod detector;
pub mod distance;
pub mod error;
pub mod event;
pub mod frame;
pub mod histogram;
#[cfg(feature = "rayon")]
mod parallel;
pub mod progress;
pub mod report;
pub mod sampler;
pub mod snapshot;
pub mod source;
pub mod timecode;
pub mod tracker;

pub use boundary::{DEFAULT_THRESHOLD, is_boundary};
pub use configuration::DetectionOptions;
pub use detector::{DetectionSummary, ShotDetector};
pub use distance::{DistanceMethod, distance};
pub use error::ShotDetectError;
pub use event::{EventSink, ShotEvent};
pub use frame::{Frame, FrameSource, MemorySource};
pub use histogram::{ColorHistogram, DEFAULT_BINS_PER_CHANNEL};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use report::{ReportFormat, ReportWriter};
pub use sampler::FrameSampler;
pub use snapshot::FrameSaver;
pub use source::{VideoInfo, VideoSource, set_ffmpeg_log_level};
pub use timecode::format_timestamp;
pub use tracker::{FrameMark, Shot, ShotLog, ShotTracker, TrackerState};
