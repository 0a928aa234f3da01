//! Error types for the `shotdetect` crate.
//!
//! This module defines [`ShotDetectError`], the unified error type returned by
//! all fallible operations in the crate. None of these conditions is transient:
//! every error is final at the point of detection and is propagated to the
//! caller, which owns any user-facing reporting.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `shotdetect` operations.
///
/// Every public method that can fail returns `Result<T, ShotDetectError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShotDetectError {
    /// A frame that cannot be histogrammed reached the extractor.
    ///
    /// Raised for zero-pixel frames, frames that do not have exactly three
    /// color channels, and raw buffers whose length does not match the
    /// declared dimensions.
    #[error("Invalid frame ({width}x{height}, {channels} channel(s)): {reason}")]
    InvalidFrame {
        /// Frame width in pixels.
        width: u32,
        /// Frame height in pixels.
        height: u32,
        /// Number of interleaved color channels.
        channels: u8,
        /// What is wrong with the frame.
        reason: String,
    },

    /// Two histograms of different shape were compared.
    #[error(
        "Histogram shape mismatch: {left} bins per channel vs {right} bins per channel"
    )]
    ShapeMismatch {
        /// Bins per channel of the left-hand histogram.
        left: usize,
        /// Bins per channel of the right-hand histogram.
        right: usize,
    },

    /// The frame source could not be opened.
    ///
    /// Reported before any frame is processed, so no partial output exists.
    #[error("Failed to open video source at {path}: {reason}")]
    SourceUnavailable {
        /// Path that was passed to [`crate::VideoSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// An opened shot was never closed, or the event stream is otherwise
    /// structurally inconsistent.
    ///
    /// This indicates a bug in the event producer, not a runtime condition.
    #[error("Unterminated shot: {0}")]
    UnterminatedShot(String),

    /// A detection or extraction setting is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while writing a report or a saved frame.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while saving or loading a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for ShotDetectError {
    fn from(error: FfmpegError) -> Self {
        ShotDetectError::FfmpegError(error.to_string())
    }
}
