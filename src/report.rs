//! Streaming result reports.
//!
//! A [`ReportWriter`] writes one header record describing the video, then one
//! record per [`ShotEvent`] as detection produces it. Nothing is buffered
//! beyond the underlying writer, so a report of an aborted or failed run
//! still holds every event delivered before the stop.
//!
//! Three formats are supported:
//!
//! | Format | Extension | Shape |
//! |--------|-----------|-------|
//! | [`ReportFormat::Xml`] | `.xml` | `<shotdetect>` document with `<header>` and `<shots>` |
//! | [`ReportFormat::Text`] | `.txt` | `key: value` header, one line per event |
//! | [`ReportFormat::Json`] | `.jsonl` | one JSON object per line |

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde_json::json;

use crate::{
    error::ShotDetectError,
    event::{EventSink, ShotEvent},
    frame::Frame,
    source::VideoInfo,
    timecode::format_timestamp,
};

/// Output format of a [`ReportWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// XML document.
    #[default]
    Xml,
    /// Plain text, one record per line.
    Text,
    /// JSON Lines.
    Json,
}

impl ReportFormat {
    /// File extension (without the dot) appended by [`ReportWriter::create`].
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Xml => "xml",
            ReportFormat::Text => "txt",
            ReportFormat::Json => "jsonl",
        }
    }

    /// `base` with this format's extension appended.
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use shotdetect::ReportFormat;
    ///
    /// assert_eq!(ReportFormat::Json.path_for("out/result"), Path::new("out/result.jsonl"));
    /// ```
    pub fn path_for<P: AsRef<Path>>(self, base: P) -> PathBuf {
        let mut path = base.as_ref().as_os_str().to_owned();
        path.push(".");
        path.push(self.extension());
        PathBuf::from(path)
    }
}

impl Display for ReportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            ReportFormat::Xml => "xml",
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
        })
    }
}

/// Where the writer is in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Empty,
    Header,
    Shots,
    Finished,
}

/// Writes detection results as they arrive.
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use shotdetect::{ReportFormat, ReportWriter, ShotEvent};
///
/// let mut report = ReportWriter::new(Vec::new(), ReportFormat::Text);
/// report.write_event(&ShotEvent::ShotBegin { frame: 1, timestamp: Duration::ZERO })?;
/// report.write_event(&ShotEvent::ShotEnd { frame: 90, timestamp: Duration::from_secs(3) })?;
///
/// let text = String::from_utf8(report.into_inner()?).unwrap();
/// assert_eq!(text, "shot_begin 1 00:00\nshot_end 90 00:03\n");
/// # Ok::<(), shotdetect::ShotDetectError>(())
/// ```
#[derive(Debug)]
pub struct ReportWriter<W: Write> {
    writer: W,
    format: ReportFormat,
    stage: Stage,
    path: Option<PathBuf>,
}

impl ReportWriter<BufWriter<File>> {
    /// Create a report file at `base` plus the format's extension.
    ///
    /// An existing file at that path is truncated.
    ///
    /// # Errors
    ///
    /// Returns [`ShotDetectError::IoError`] if the file cannot be created.
    pub fn create<P: AsRef<Path>>(base: P, format: ReportFormat) -> Result<Self, ShotDetectError> {
        let path = format.path_for(base);
        log::debug!("Writing {format} report to {}", path.display());
        let file = File::create(&path)?;
        let mut writer = Self::new(BufWriter::new(file), format);
        writer.path = Some(path);
        Ok(writer)
    }
}

impl<W: Write> ReportWriter<W> {
    /// Wrap any writer.
    pub fn new(writer: W, format: ReportFormat) -> Self {
        Self {
            writer,
            format,
            stage: Stage::Empty,
            path: None,
        }
    }

    /// Report format.
    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// File path, when created through [`create`](ReportWriter::create).
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the header record.
    ///
    /// # Errors
    ///
    /// Returns [`ShotDetectError::InvalidConfiguration`] if a header or an
    /// event was already written, or an I/O error from the writer.
    pub fn write_header(&mut self, info: &VideoInfo) -> Result<(), ShotDetectError> {
        if self.stage != Stage::Empty {
            return Err(ShotDetectError::InvalidConfiguration(
                "report header must be written before any event".to_string(),
            ));
        }

        let video_path = info.path.display().to_string();
        match self.format {
            ReportFormat::Xml => {
                self.open_document()?;
                writeln!(self.writer, "  <header>")?;
                writeln!(
                    self.writer,
                    "    <video_path>{}</video_path>",
                    escape_xml(&video_path)
                )?;
                writeln!(self.writer, "    <fps>{:.2}</fps>", info.frames_per_second)?;
                writeln!(
                    self.writer,
                    "    <frame_count>{}</frame_count>",
                    info.frame_count
                )?;
                writeln!(self.writer, "  </header>")?;
            }
            ReportFormat::Text => {
                writeln!(self.writer, "video_path: {video_path}")?;
                writeln!(self.writer, "fps: {:.2}", info.frames_per_second)?;
                writeln!(self.writer, "frame_count: {}", info.frame_count)?;
                writeln!(self.writer)?;
            }
            ReportFormat::Json => {
                let record = json!({
                    "record": "header",
                    "video_path": video_path,
                    "fps": info.frames_per_second,
                    "frame_count": info.frame_count,
                });
                writeln!(self.writer, "{record}")?;
            }
        }

        self.stage = Stage::Header;
        Ok(())
    }

    /// Write one event record.
    ///
    /// # Errors
    ///
    /// Returns [`ShotDetectError::InvalidConfiguration`] after
    /// [`finish`](Self::finish), or an I/O error from the writer.
    pub fn write_event(&mut self, event: &ShotEvent) -> Result<(), ShotDetectError> {
        self.enter_shots()?;

        let frame = event.frame();
        let time = format_timestamp(event.timestamp());
        match self.format {
            ReportFormat::Xml => writeln!(
                self.writer,
                "    <{} frame_number=\"{frame}\" time=\"{time}\"/>",
                event.kind()
            )?,
            ReportFormat::Text => writeln!(self.writer, "{} {frame} {time}", event.kind())?,
            ReportFormat::Json => {
                let record = json!({
                    "record": event.kind(),
                    "frame": frame,
                    "time": time,
                    "timestamp_ms": event.timestamp().as_millis() as u64,
                });
                writeln!(self.writer, "{record}")?;
            }
        }
        Ok(())
    }

    /// Close any open document structure and flush.
    ///
    /// Calling `finish` more than once is harmless.
    ///
    /// # Errors
    ///
    /// Returns an I/O error from the writer.
    pub fn finish(&mut self) -> Result<(), ShotDetectError> {
        if self.stage == Stage::Finished {
            return Ok(());
        }

        if self.format == ReportFormat::Xml {
            self.enter_shots()?;
            writeln!(self.writer, "  </shots>")?;
            writeln!(self.writer, "</shotdetect>")?;
        }

        self.writer.flush()?;
        self.stage = Stage::Finished;
        Ok(())
    }

    /// Finish the report and return the underlying writer.
    ///
    /// # Errors
    ///
    /// Same as [`finish`](Self::finish).
    pub fn into_inner(mut self) -> Result<W, ShotDetectError> {
        self.finish()?;
        Ok(self.writer)
    }

    fn open_document(&mut self) -> Result<(), ShotDetectError> {
        writeln!(self.writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        writeln!(self.writer, "<shotdetect>")?;
        Ok(())
    }

    /// Move into the shots section, writing whatever the format needs first.
    fn enter_shots(&mut self) -> Result<(), ShotDetectError> {
        match self.stage {
            Stage::Shots => return Ok(()),
            Stage::Finished => {
                return Err(ShotDetectError::InvalidConfiguration(
                    "report is already finished".to_string(),
                ));
            }
            Stage::Empty if self.format == ReportFormat::Xml => self.open_document()?,
            Stage::Empty | Stage::Header => {}
        }

        if self.format == ReportFormat::Xml {
            writeln!(self.writer, "  <shots>")?;
        }
        self.stage = Stage::Shots;
        Ok(())
    }
}

impl<W: Write> EventSink for ReportWriter<W> {
    fn on_event(&mut self, event: &ShotEvent, _frame: &Frame) -> Result<(), ShotDetectError> {
        self.write_event(event)
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
