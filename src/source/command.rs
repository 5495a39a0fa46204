//! Camera capture through an external command.
//!
//! The command is an argv list. An `{output}` argument is replaced with a
//! temporary file path the command must write the image to; without the
//! placeholder the image is read from the command's stdout.

use crate::model::{CaptureError, CapturedImage, ImageOrigin};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::process::Command;
use tracing::{debug, warn};

const OUTPUT_PLACEHOLDER: &str = "{output}";

/// A configured capture command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureCommand {
    argv: Vec<String>,
}

impl CaptureCommand {
    /// Wrap an argv list. Returns `None` when it is empty.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        if argv.is_empty() || argv[0].trim().is_empty() {
            return None;
        }
        Some(Self { argv })
    }

    /// The configured argv.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    fn writes_to_file(&self) -> bool {
        self.argv.iter().any(|arg| arg == OUTPUT_PLACEHOLDER)
    }

    /// Run the command and read back the image.
    ///
    /// # Errors
    ///
    /// `CommandFailed` on a non-zero exit, `Io` when the command cannot be
    /// spawned or its output cannot be read, and `Empty`/`UnsupportedFormat`
    /// for unusable image data.
    pub async fn capture(&self) -> Result<CapturedImage, CaptureError> {
        let output_path = self.writes_to_file().then(temp_output_path);

        let mut argv = self.argv.clone();
        if let Some(path) = &output_path {
            let rendered = path.to_string_lossy().into_owned();
            for arg in argv.iter_mut().filter(|arg| arg.as_str() == OUTPUT_PLACEHOLDER) {
                *arg = rendered.clone();
            }
        }
        let program = argv.remove(0);

        debug!(%program, args = argv.len(), "Running capture command");
        let output = Command::new(&program)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            if let Some(path) = &output_path {
                remove_quietly(path).await;
            }
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            warn!(status = %output.status, "Capture command failed");
            return Err(CaptureError::CommandFailed {
                status: output.status.to_string(),
                stderr,
            });
        }

        let bytes = match &output_path {
            Some(path) => {
                let read = tokio::fs::read(path).await;
                remove_quietly(path).await;
                match read {
                    Ok(bytes) => bytes,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        return Err(CaptureError::Empty)
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            None => output.stdout,
        };
        CapturedImage::from_bytes(bytes, ImageOrigin::Camera)
    }
}

fn temp_output_path() -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!(
        "mealsnap-capture-{}-{nanos}.img",
        std::process::id()
    ))
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(path = %path.display(), error = %e, "Could not remove capture file");
        }
    }
}
