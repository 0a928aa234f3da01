//! Raster frames and the pull-based frame source contract.
//!
//! A [`Frame`] is an immutable, tightly packed, interleaved 8-bit raster.
//! Frames reach the detector through a [`FrameSource`], which yields them in
//! presentation order and exposes the position and timestamp of the frame it
//! yielded last.
//!
//! [`MemorySource`] is a ready-made source over frames that are already in
//! memory. The FFmpeg-backed source lives in [`crate::source`].

use std::{collections::VecDeque, time::Duration};

use image::RgbImage;

use crate::{error::ShotDetectError, source::VideoInfo};

/// An immutable 8-bit raster image.
///
/// Pixel data is stored row-major with `channels` interleaved bytes per pixel
/// and no row padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap a raw pixel buffer.
    ///
    /// Zero-sized frames are accepted here; they are rejected later by the
    /// histogram extractor.
    ///
    /// # Errors
    ///
    /// Returns [`ShotDetectError::InvalidFrame`] if `channels` is zero or the
    /// buffer length is not `width * height * channels`.
    pub fn new(
        width: u32,
        height: u32,
        channels: u8,
        data: Vec<u8>,
    ) -> Result<Self, ShotDetectError> {
        let invalid = |reason: String| ShotDetectError::InvalidFrame {
            width,
            height,
            channels,
            reason,
        };

        if channels == 0 {
            return Err(invalid("frame must have at least one channel".to_string()));
        }

        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(invalid(format!(
                "pixel buffer holds {} bytes, expected {expected}",
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Create an RGB frame where every pixel has the same color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixel_count = width as usize * height as usize;
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(pixel_count * 3)
            .collect();
        Self {
            width,
            height,
            channels: 3,
            data,
        }
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of interleaved channels per pixel.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Raw interleaved pixel bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of pixels (`width * height`).
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Copy the frame into an [`RgbImage`] for saving or further processing.
    ///
    /// # Errors
    ///
    /// Returns [`ShotDetectError::InvalidFrame`] unless the frame has exactly
    /// three channels.
    pub fn to_rgb_image(&self) -> Result<RgbImage, ShotDetectError> {
        if self.channels != 3 {
            return Err(ShotDetectError::InvalidFrame {
                width: self.width,
                height: self.height,
                channels: self.channels,
                reason: "only 3-channel frames convert to RGB images".to_string(),
            });
        }

        RgbImage::from_raw(self.width, self.height, self.data.clone()).ok_or_else(|| {
            ShotDetectError::InvalidFrame {
                width: self.width,
                height: self.height,
                channels: self.channels,
                reason: "pixel buffer does not fit the frame dimensions".to_string(),
            }
        })
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 3,
            data: image.into_raw(),
        }
    }
}

/// A pull-based producer of frames in presentation order.
///
/// After each successful [`next_frame`](FrameSource::next_frame),
/// [`position`](FrameSource::position) reports how many frames have been
/// yielded so far (so the first frame is at position 1) and
/// [`timestamp`](FrameSource::timestamp) reports that frame's presentation
/// time. `Ok(None)` marks the end of the stream and must be terminal.
pub trait FrameSource {
    /// Yield the next frame, or `None` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, ShotDetectError>;

    /// Position of the most recently yielded frame.
    fn position(&self) -> u64;

    /// Presentation timestamp of the most recently yielded frame.
    fn timestamp(&self) -> Duration;

    /// Stream-level information used for report headers and progress totals.
    fn info(&self) -> Option<&VideoInfo> {
        None
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn next_frame(&mut self) -> Result<Option<Frame>, ShotDetectError> {
        (**self).next_frame()
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn timestamp(&self) -> Duration {
        (**self).timestamp()
    }

    fn info(&self) -> Option<&VideoInfo> {
        (**self).info()
    }
}

/// A [`FrameSource`] over frames that are already decoded.
///
/// # Example
///
/// ```
/// use shotdetect::{Frame, FrameSource, MemorySource};
///
/// let frames = vec![Frame::filled(4, 4, [0, 0, 0]); 3];
/// let mut source = MemorySource::at_frame_rate(frames, 25.0);
///
/// source.next_frame()?;
/// source.next_frame()?;
/// assert_eq!(source.position(), 2);
/// assert_eq!(source.timestamp().as_millis(), 40);
/// # Ok::<(), shotdetect::ShotDetectError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    frames: VecDeque<(Frame, Duration)>,
    position: u64,
    timestamp: Duration,
    info: Option<VideoInfo>,
}

impl MemorySource {
    /// Create a source from `(frame, presentation timestamp)` pairs.
    ///
    /// Timestamps are expected to be non-decreasing.
    pub fn new<I>(frames: I) -> Self
    where
        I: IntoIterator<Item = (Frame, Duration)>,
    {
        Self {
            frames: frames.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Create a source whose timestamps follow a constant frame rate.
    ///
    /// The frame at position `n` is stamped `(n - 1) / frames_per_second`.
    /// A non-positive rate stamps every frame at zero.
    pub fn at_frame_rate<I>(frames: I, frames_per_second: f64) -> Self
    where
        I: IntoIterator<Item = Frame>,
    {
        Self::new(frames.into_iter().enumerate().map(|(index, frame)| {
            let timestamp = if frames_per_second > 0.0 {
                Duration::from_secs_f64(index as f64 / frames_per_second)
            } else {
                Duration::ZERO
            };
            (frame, timestamp)
        }))
    }

    /// Attach stream-level information (reported through [`FrameSource::info`]).
    #[must_use]
    pub fn with_info(mut self, info: VideoInfo) -> Self {
        self.info = Some(info);
        self
    }

    /// Number of frames not yet yielded.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<Frame>, ShotDetectError> {
        Ok(self.frames.pop_front().map(|(frame, timestamp)| {
            self.position += 1;
            self.timestamp = timestamp;
            frame
        }))
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn timestamp(&self) -> Duration {
        self.timestamp
    }

    fn info(&self) -> Option<&VideoInfo> {
        self.info.as_ref()
    }
}
