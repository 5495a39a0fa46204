//! Offline meal store: one JSON record per line.

use super::MealStore;
use crate::model::{MealRecord, PersistedId, SubmissionError};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Appends committed meals to a JSONL file.
///
/// The persisted id is `local-{n}` where `n` is the 1-based line number of
/// the record. A partial last line left by an interrupted write is closed
/// off before appending and still counts as a line.
#[derive(Debug)]
pub struct JsonlMealStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlMealStore {
    /// Store writing to `path`. Nothing is touched until the first commit.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// File the store appends to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines already in the file, and whether the last one lacks its newline.
    async fn existing_lines(&self) -> io::Result<(usize, bool)> {
        match fs::read(&self.path).await {
            Ok(contents) => {
                let complete = contents.iter().filter(|&&b| b == b'\n').count();
                let torn = contents.last().is_some_and(|&b| b != b'\n');
                Ok((complete, torn))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok((0, false)),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl MealStore for JsonlMealStore {
    async fn commit(&self, meal: &MealRecord) -> Result<PersistedId, SubmissionError> {
        let mut line = serde_json::to_string(meal)
            .map_err(|e| SubmissionError::Storage(format!("cannot serialize meal: {e}")))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(parent, e))?;
        }
        let (complete, torn) = self
            .existing_lines()
            .await
            .map_err(|e| storage_error(&self.path, e))?;
        let mut line_number = complete + 1;
        if torn {
            // Terminate the partial line so the new record starts on its own.
            warn!(path = %self.path.display(), "Meal file ends in a partial line");
            line.insert(0, '\n');
            line_number += 1;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| storage_error(&self.path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| storage_error(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| storage_error(&self.path, e))?;

        let id = PersistedId::new(format!("local-{line_number}"))
            .map_err(|e| SubmissionError::Storage(e.to_string()))?;
        info!(meal_id = %id, path = %self.path.display(), "Meal appended");
        Ok(id)
    }
}

fn storage_error(path: &Path, error: io::Error) -> SubmissionError {
    SubmissionError::Storage(format!("{}: {error}", path.display()))
}
