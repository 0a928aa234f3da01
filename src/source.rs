//! FFmpeg-backed frame source.
//!
//! [`VideoSource`] opens a media file, locates its best video stream, and
//! decodes it forward to RGB24 [`Frame`]s in presentation order. Stream
//! information is read once at open time and cached as [`VideoInfo`].
//!
//! # Example
//!
//! ```no_run
//! use shotdetect::{FrameSource, ShotDetectError, VideoSource};
//!
//! let mut source = VideoSource::open("input.mp4")?;
//! println!("{:.2} fps, ~{} frames", source.video_info().frames_per_second,
//!     source.video_info().frame_count);
//!
//! while let Some(frame) = source.next_frame()? {
//!     println!("frame {} at {:?}: {}x{}", source.position(), source.timestamp(),
//!         frame.width(), frame.height());
//! }
//! # Ok::<(), ShotDetectError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
    util::log::Level,
};

use crate::{
    error::ShotDetectError,
    frame::{Frame, FrameSource},
};

/// Consecutive unreadable packets tolerated before decoding gives up.
const MAX_CONSECUTIVE_READ_ERRORS: u32 = 64;

/// Stream-level information about a video.
///
/// Written once as the report header.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    /// Path the video was opened from.
    pub path: PathBuf,
    /// Decoded frame width in pixels (before any analysis downscaling).
    pub width: u32,
    /// Decoded frame height in pixels (before any analysis downscaling).
    pub height: u32,
    /// Average frames per second (approximate for variable-frame-rate content).
    pub frames_per_second: f64,
    /// Frame count reported by the container, or estimated from duration and
    /// frame rate when the container does not report one.
    pub frame_count: u64,
    /// Container duration.
    pub duration: Duration,
}

/// Sequential RGB24 frame decoder over a media file.
///
/// Positions count decoded frames (the first frame is at position 1);
/// timestamps come from each frame's best-effort PTS.
pub struct VideoSource {
    input_context: Input,
    decoder: VideoDecoder,
    scaler: Option<ScalerState>,
    video_stream_index: usize,
    time_base: Rational,
    info: VideoInfo,
    target_width: u32,
    target_height: u32,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    position: u64,
    timestamp: Duration,
    eof_sent: bool,
    done: bool,
}

/// A scaler together with the input geometry it was built for.
struct ScalerState {
    context: ScalingContext,
    format: Pixel,
    width: u32,
    height: u32,
}

impl Debug for VideoSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("VideoSource")
            .field("info", &self.info)
            .field("video_stream_index", &self.video_stream_index)
            .field("target_width", &self.target_width)
            .field("target_height", &self.target_height)
            .field("position", &self.position)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

impl VideoSource {
    /// Open a video file at its native resolution.
    ///
    /// # Errors
    ///
    /// Returns [`ShotDetectError::SourceUnavailable`] if FFmpeg cannot be
    /// initialized, the file cannot be opened, it has no video stream, or no
    /// decoder is available for it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ShotDetectError> {
        Self::open_with_resolution(path, None, None)
    }

    /// Open a video file and scale frames for analysis.
    ///
    /// Pass `None` for either dimension to keep the source value. When only
    /// one dimension is given, the other is derived from the source aspect
    /// ratio. Downscaling speeds up histogram extraction considerably and
    /// has little effect on color distributions.
    ///
    /// # Errors
    ///
    /// Same as [`open`](VideoSource::open).
    pub fn open_with_resolution<P: AsRef<Path>>(
        path: P,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Self, ShotDetectError> {
        let path = path.as_ref().to_path_buf();
        let unavailable = |reason: String| ShotDetectError::SourceUnavailable {
            path: path.clone(),
            reason,
        };

        log::debug!("Opening video source: {}", path.display());

        ffmpeg_next::init()
            .map_err(|error| unavailable(format!("FFmpeg initialisation failed: {error}")))?;

        let input_context =
            ffmpeg_next::format::input(&path).map_err(|error| unavailable(error.to_string()))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| unavailable("no video stream found".to_string()))?;
        let video_stream_index = stream.index();
        let time_base = stream.time_base();

        let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(|error| {
            unavailable(format!("failed to read video codec parameters: {error}"))
        })?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| unavailable(format!("failed to create video decoder: {error}")))?;

        let duration = match input_context.duration() {
            micros if micros > 0 => Duration::from_micros(micros as u64),
            _ => Duration::ZERO,
        };

        let frames_per_second = rational_to_f64(stream.avg_frame_rate())
            .or_else(|| rational_to_f64(stream.rate()))
            .unwrap_or(0.0);

        let frame_count = match stream.frames() {
            frames if frames > 0 => frames as u64,
            _ if frames_per_second > 0.0 => {
                (duration.as_secs_f64() * frames_per_second) as u64
            }
            _ => 0,
        };

        let info = VideoInfo {
            path: path.clone(),
            width: decoder.width(),
            height: decoder.height(),
            frames_per_second,
            frame_count,
            duration,
        };

        let (target_width, target_height) =
            resolve_dimensions(width, height, info.width, info.height);

        log::debug!(
            "Video stream {}: {}x{} @ {:.3} fps, ~{} frames, analysing at {}x{}",
            video_stream_index,
            info.width,
            info.height,
            info.frames_per_second,
            info.frame_count,
            target_width,
            target_height,
        );

        Ok(Self {
            input_context,
            decoder,
            scaler: None,
            video_stream_index,
            time_base,
            info,
            target_width,
            target_height,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            position: 0,
            timestamp: Duration::ZERO,
            eof_sent: false,
            done: false,
        })
    }

    /// Cached stream information.
    pub fn video_info(&self) -> &VideoInfo {
        &self.info
    }

    /// Dimensions of the frames this source yields.
    pub fn output_dimensions(&self) -> (u32, u32) {
        (self.target_width, self.target_height)
    }

    /// Scale the current `decoded_frame` to RGB24 and copy it out.
    fn convert_current_frame(&mut self) -> Result<Frame, ShotDetectError> {
        let format = self.decoded_frame.format();
        let width = self.decoded_frame.width();
        let height = self.decoded_frame.height();

        // Some decoders change pixel format or size mid-stream.
        let stale = self.scaler.as_ref().is_none_or(|scaler| {
            scaler.format != format || scaler.width != width || scaler.height != height
        });
        if stale {
            let context = ScalingContext::get(
                format,
                width,
                height,
                Pixel::RGB24,
                self.target_width,
                self.target_height,
                ScalingFlags::BILINEAR,
            )?;
            self.scaler = Some(ScalerState {
                context,
                format,
                width,
                height,
            });
        }

        let scaler = self
            .scaler
            .as_mut()
            .ok_or_else(|| ShotDetectError::VideoDecodeError("scaler unavailable".to_string()))?;
        scaler.context.run(&self.decoded_frame, &mut self.scaled_frame)?;

        let buffer = packed_rgb_buffer(&self.scaled_frame, self.target_width, self.target_height);
        Frame::new(self.target_width, self.target_height, 3, buffer)
    }

    /// Presentation time of the current `decoded_frame`.
    fn current_timestamp(&self) -> Duration {
        match self.decoded_frame.timestamp().or_else(|| self.decoded_frame.pts()) {
            Some(pts) => Duration::from_secs_f64(pts_to_seconds(pts, self.time_base).max(0.0)),
            None if self.info.frames_per_second > 0.0 => Duration::from_secs_f64(
                self.position.saturating_sub(1) as f64 / self.info.frames_per_second,
            ),
            None => self.timestamp,
        }
    }
}

impl FrameSource for VideoSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, ShotDetectError> {
        let mut consecutive_read_errors = 0_u32;

        loop {
            if self.done {
                return Ok(None);
            }

            match self.decoder.receive_frame(&mut self.decoded_frame) {
                Ok(()) => {
                    let frame = self.convert_current_frame()?;
                    self.position += 1;
                    self.timestamp = self.current_timestamp();
                    log::trace!("Decoded frame {} at {:?}", self.position, self.timestamp);
                    return Ok(Some(frame));
                }
                Err(FfmpegError::Eof) => {
                    self.done = true;
                    log::debug!("Video source exhausted after {} frame(s)", self.position);
                    return Ok(None);
                }
                // EAGAIN: the decoder wants another packet.
                Err(FfmpegError::Other { .. }) if !self.eof_sent => {}
                Err(error) if self.eof_sent => {
                    self.done = true;
                    return Err(ShotDetectError::VideoDecodeError(format!(
                        "decoder failed while draining after frame {}: {error}",
                        self.position
                    )));
                }
                Err(error) => {
                    log::warn!("Decoder error after frame {}: {error}", self.position);
                }
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input_context) {
                Ok(()) => {
                    consecutive_read_errors = 0;
                    if packet.stream() == self.video_stream_index {
                        self.decoder
                            .send_packet(&packet)
                            .map_err(|error| ShotDetectError::VideoDecodeError(error.to_string()))?;
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    consecutive_read_errors += 1;
                    if consecutive_read_errors >= MAX_CONSECUTIVE_READ_ERRORS {
                        return Err(ShotDetectError::VideoDecodeError(format!(
                            "giving up after {consecutive_read_errors} unreadable packets: {error}"
                        )));
                    }
                    log::warn!("Skipping unreadable packet: {error}");
                }
            }
        }
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn timestamp(&self) -> Duration {
        self.timestamp
    }

    fn info(&self) -> Option<&VideoInfo> {
        Some(&self.info)
    }
}

/// Tune FFmpeg's own console output.
///
/// FFmpeg logs through its own channel, separate from the `log` facade used
/// by this crate. `Off` silences it completely.
pub fn set_ffmpeg_log_level(level: log::LevelFilter) {
    let level = match level {
        log::LevelFilter::Off => Level::Quiet,
        log::LevelFilter::Error => Level::Error,
        log::LevelFilter::Warn => Level::Warning,
        log::LevelFilter::Info => Level::Info,
        log::LevelFilter::Debug => Level::Debug,
        log::LevelFilter::Trace => Level::Trace,
    };
    ffmpeg_next::util::log::set_level(level);
}

/// Resolve analysis dimensions from optional targets and the source size.
///
/// Returns `(width, height)`. A single requested dimension keeps the source
/// aspect ratio.
pub(crate) fn resolve_dimensions(
    width: Option<u32>,
    height: Option<u32>,
    source_width: u32,
    source_height: u32,
) -> (u32, u32) {
    match (width, height) {
        (Some(w), Some(h)) => (w.max(1), h.max(1)),
        (Some(w), None) if source_width > 0 => {
            let h = (source_height as f64 * w as f64 / source_width as f64).round() as u32;
            (w.max(1), h.max(1))
        }
        (None, Some(h)) if source_height > 0 => {
            let w = (source_width as f64 * h as f64 / source_height as f64).round() as u32;
            (w.max(1), h.max(1))
        }
        _ => (source_width, source_height),
    }
}

fn rational_to_f64(rate: Rational) -> Option<f64> {
    (rate.numerator() > 0 && rate.denominator() > 0)
        .then(|| rate.numerator() as f64 / rate.denominator() as f64)
}

fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Copy the first plane of a packed RGB24 frame, dropping row padding.
fn packed_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = width as usize * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * height as usize].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}
