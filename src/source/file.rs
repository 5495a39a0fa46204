//! Gallery pick: read an image from a file.

use crate::model::{CaptureError, CapturedImage, ImageOrigin};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Picks the image stored at a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePicker {
    path: PathBuf,
}

impl FilePicker {
    /// Picker for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path this picker reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and validate the image.
    ///
    /// # Errors
    ///
    /// Returns `CaptureError::NotFound` if the file does not exist,
    /// `Empty`/`UnsupportedFormat` for unusable contents and `Io` for other
    /// read failures.
    pub async fn pick(&self) -> Result<CapturedImage, CaptureError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CaptureError::NotFound {
                    path: self.path.clone(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        debug!(path = %self.path.display(), bytes = bytes.len(), "Read image file");
        CapturedImage::from_bytes(bytes, ImageOrigin::Gallery)
    }
}
