//! Image sources.
//!
//! This module provides the two ways an image enters a session:
//! - Camera capture through a configured external command
//! - Gallery pick from a file on disk
//!
//! Both are unified behind the [`ImageSource`] trait so the workflow driver
//! does not care where bytes come from.

use crate::model::{CaptureError, CapturedImage};
use async_trait::async_trait;

pub mod command;
pub mod file;

pub use command::CaptureCommand;
pub use file::FilePicker;

/// Produces images for a session.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Take a new photo.
    async fn capture(&self) -> Result<CapturedImage, CaptureError>;

    /// Select an existing photo.
    async fn pick(&self) -> Result<CapturedImage, CaptureError>;
}

/// Image source backed by the local machine.
///
/// Either half may be missing; the corresponding call then fails with
/// `CaptureError::Unavailable`.
#[derive(Debug, Clone, Default)]
pub struct LocalImageSource {
    camera: Option<CaptureCommand>,
    gallery: Option<FilePicker>,
}

impl LocalImageSource {
    /// Source with the given camera command and gallery file.
    pub fn new(camera: Option<CaptureCommand>, gallery: Option<FilePicker>) -> Self {
        Self { camera, gallery }
    }

    /// Whether a camera command is configured.
    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }
}

#[async_trait]
impl ImageSource for LocalImageSource {
    async fn capture(&self) -> Result<CapturedImage, CaptureError> {
        match &self.camera {
            Some(command) => command.capture().await,
            None => Err(CaptureError::Unavailable("no capture_command configured")),
        }
    }

    async fn pick(&self) -> Result<CapturedImage, CaptureError> {
        match &self.gallery {
            Some(picker) => picker.pick().await,
            None => Err(CaptureError::Unavailable("no image file given")),
        }
    }
}
