//! Saving event frames to disk.

use std::path::{Path, PathBuf};

use crate::{
    error::ShotDetectError,
    event::{EventSink, ShotEvent},
    frame::Frame,
};

/// An [`EventSink`] that saves the frame of each shot begin, shot end, and
/// sample as an image file.
///
/// Files are named `shot_begin_{frame:06}.{ext}`, `shot_end_{frame:06}.{ext}`,
/// and `sample_{frame:06}.{ext}`; the image format follows the extension.
/// Abort markers save nothing. Existing files are replaced unless
/// [`with_overwrite(false)`](FrameSaver::with_overwrite) is set.
#[derive(Debug, Clone)]
pub struct FrameSaver {
    directory: PathBuf,
    extension: String,
    overwrite: bool,
    saved: u64,
}

impl FrameSaver {
    /// Create a saver writing into `directory`, creating it if needed.
    ///
    /// A leading dot on `extension` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ShotDetectError::InvalidConfiguration`] for an empty
    /// extension, or [`ShotDetectError::IoError`] if the directory cannot be
    /// created.
    pub fn new<P: AsRef<Path>>(directory: P, extension: &str) -> Result<Self, ShotDetectError> {
        let extension = extension.trim_start_matches('.');
        if extension.is_empty() {
            return Err(ShotDetectError::InvalidConfiguration(
                "image extension must not be empty".to_string(),
            ));
        }

        let directory = directory.as_ref().to_path_buf();
        std::fs::create_dir_all(&directory)?;

        Ok(Self {
            directory,
            extension: extension.to_string(),
            overwrite: true,
            saved: 0,
        })
    }

    /// Whether an existing image may be replaced. With `false`, saving onto
    /// an existing file fails with [`ShotDetectError::IoError`].
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Output directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Where the frame for `event` is saved, or `None` for events that save
    /// nothing.
    pub fn path_for(&self, event: &ShotEvent) -> Option<PathBuf> {
        let prefix = match event {
            ShotEvent::ShotBegin { .. } => "shot_begin",
            ShotEvent::ShotEnd { .. } => "shot_end",
            ShotEvent::Sampled { .. } => "sample",
            ShotEvent::Aborted { .. } => return None,
        };
        Some(self.directory.join(format!(
            "{prefix}_{:06}.{}",
            event.frame(),
            self.extension
        )))
    }

    /// Number of images written so far.
    pub fn saved_count(&self) -> u64 {
        self.saved
    }
}

impl EventSink for FrameSaver {
    fn on_event(&mut self, event: &ShotEvent, frame: &Frame) -> Result<(), ShotDetectError> {
        let Some(path) = self.path_for(event) else {
            return Ok(());
        };

        if !self.overwrite && path.exists() {
            return Err(ShotDetectError::IoError(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("refusing to overwrite {}", path.display()),
            )));
        }

        log::debug!("Saving frame {} to {}", event.frame(), path.display());
        frame.to_rgb_image()?.save(&path)?;
        self.saved += 1;
        Ok(())
    }
}
