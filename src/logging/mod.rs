//! Tracing subscriber initialization.
//!
//! Logs go to a file so they never interleave with the interactive shell.
//! Follow them with `tail -f` in a separate terminal.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
///
/// HTTP client internals are noisy at `info`; keep them to warnings.
pub const DEFAULT_FILTER: &str = "info,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn";

/// Error type for logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory at {path:?}: {source}")]
    DirectoryCreation {
        /// The directory path that failed to be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid log file path (no filename component)
    #[error("Invalid log file path: {0:?}")]
    InvalidPath(PathBuf),

    /// Tracing subscriber already initialized
    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Split `log_path` into directory and file name, creating the directory.
///
/// A bare file name logs to the current directory.
///
/// # Errors
///
/// `InvalidPath` when there is no UTF-8 file name, `DirectoryCreation` when
/// the directory cannot be created.
pub fn prepare_log_file(log_path: &Path) -> Result<(PathBuf, String), LoggingError> {
    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?
        .to_string();

    let directory = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    std::fs::create_dir_all(&directory).map_err(|source| LoggingError::DirectoryCreation {
        path: directory.clone(),
        source,
    })?;

    Ok((directory, file_name))
}

/// Filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize the tracing subscriber with file-based logging.
///
/// Writes go through a background worker; keep the returned guard alive
/// until shutdown so buffered lines are flushed.
///
/// # Errors
///
/// Returns `LoggingError` if the log file location is unusable or a
/// subscriber is already installed.
pub fn init(log_path: &Path) -> Result<WorkerGuard, LoggingError> {
    let (directory, file_name) = prepare_log_file(log_path)?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn prepare_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("state").join("mealsnap").join("mealsnap.log");

        let (directory, name) = prepare_log_file(&log_file).unwrap();
        assert!(directory.is_dir());
        assert_eq!(directory, dir.path().join("state").join("mealsnap"));
        assert_eq!(name, "mealsnap.log");
    }

    #[test]
    fn prepare_accepts_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (directory, _) = prepare_log_file(&dir.path().join("app.log")).unwrap();
        assert_eq!(directory, dir.path());
    }

    #[test]
    fn bare_file_name_logs_to_current_directory() {
        let (directory, name) = prepare_log_file(Path::new("mealsnap.log")).unwrap();
        assert_eq!(directory, PathBuf::from("."));
        assert_eq!(name, "mealsnap.log");
    }

    #[test]
    fn path_without_file_name_is_invalid() {
        let err = prepare_log_file(Path::new("/")).unwrap_err();
        assert!(matches!(err, LoggingError::InvalidPath(_)));
    }

    #[test]
    fn directory_blocked_by_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let err = prepare_log_file(&blocker.join("app.log")).unwrap_err();
        assert!(matches!(err, LoggingError::DirectoryCreation { .. }));
    }

    #[test]
    #[serial(tracing_init)]
    fn second_init_reports_subscriber_already_set() {
        let dir = tempfile::tempdir().unwrap();
        let log_file = dir.path().join("init.log");

        // Only the first install in a process can succeed.
        let _first = init(&log_file);
        let second = init(&log_file);
        assert!(matches!(second, Err(LoggingError::SubscriberAlreadySet)));
    }
}
