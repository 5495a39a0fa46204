//! Error types for mealsnap.
//!
//! This module defines the error taxonomy using `thiserror`. Each external
//! collaborator has its own error enum; [`WorkflowError`] is the single type
//! returned by coordinator and driver methods and wraps the others via `From`.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level binary error (config, logging, capture, workflow, I/O)
//!   - [`WorkflowError`] - Rejected transitions and surfaced operation failures
//!     - [`ValidationError`] - Rejected ingredient input
//!     - [`CaptureError`] - Image acquisition failures
//!     - [`AnalysisError`] - Estimation service failures
//!     - [`SubmissionError`] - Meal store failures
//!
//! # Recovery Strategy
//!
//! No failure is retried automatically. Analysis and submission failures leave
//! the session in its pre-call state so the user can retry with a fresh call.
//! Local edits are never discarded by a failure.

use crate::config::ConfigError;
use crate::logging::LoggingError;
use crate::model::{IngredientId, RequestTicket};
use crate::state::{Operation, Status};
use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error for the `mealsnap` binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or resolved.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tracing could not be initialised.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// A workflow step failed in a way the shell cannot continue from.
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Terminal I/O failed.
    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    /// An HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(String),
}

/// Image acquisition failed.
///
/// Produced by image sources before any session exists, or when retaking an
/// image for an existing session.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The selected file does not exist.
    #[error("Image not found: {path}")]
    NotFound {
        /// Path that was attempted.
        path: PathBuf,
    },

    /// The source produced zero bytes.
    #[error("Image is empty")]
    Empty,

    /// The bytes are not a recognised image encoding.
    #[error("Unsupported image format")]
    UnsupportedFormat,

    /// This source cannot perform the requested acquisition.
    #[error("Image source unavailable: {0}")]
    Unavailable(&'static str),

    /// The external capture command exited unsuccessfully.
    #[error("Capture command failed ({status}): {stderr}")]
    CommandFailed {
        /// Exit status description.
        status: String,
        /// Trimmed standard error of the command.
        stderr: String,
    },

    /// Underlying I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The analysis service could not produce an estimate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The service could not be reached, or did not answer in time.
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered but reported a failure or an unreadable body.
    #[error("Analysis service error: {0}")]
    Service(String),

    /// The service rejected the image itself.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// The call was cancelled before it completed.
    #[error("Analysis cancelled")]
    Cancelled,
}

/// The meal store did not persist the meal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// The store could not be reached, or did not answer in time.
    #[error("Network error: {0}")]
    Network(String),

    /// The store refused the meal.
    #[error("Meal rejected{}: {message}", http_suffix(.status))]
    Rejected {
        /// HTTP status, when the store is remote.
        status: Option<u16>,
        /// Reason reported by the store.
        message: String,
    },

    /// A local store failed to write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The call was cancelled before it completed.
    #[error("Submission cancelled")]
    Cancelled,
}

fn http_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// User input for an ingredient was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The ingredient name is empty after trimming.
    #[error("Ingredient name cannot be empty")]
    EmptyName,
}

/// A coordinator or driver call was rejected or its operation failed.
///
/// Guard rejections (`InvalidTransition`, `EmptyMeal`) leave state untouched.
/// Surfaced failures (`Analysis`, `Submission`, `Capture`) are returned after
/// the coordinator has already moved to the failure state.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The operation is not legal in the current status.
    #[error("Cannot {operation} while {status}")]
    InvalidTransition {
        /// Operation that was attempted.
        operation: Operation,
        /// Status at the time of the attempt.
        status: Status,
    },

    /// Submission requires at least one ingredient.
    #[error("Cannot submit a meal with no ingredients")]
    EmptyMeal,

    /// No ingredient with this id exists in the session.
    #[error("Unknown ingredient: {0}")]
    UnknownIngredient(IngredientId),

    /// An outcome arrived for a request that is no longer in flight.
    #[error("Request {0} is no longer in flight")]
    StaleTicket(RequestTicket),

    /// Ingredient input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Image acquisition failed.
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// Analysis failed.
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    /// Submission failed.
    #[error("Submission failed: {0}")]
    Submission(#[from] SubmissionError),
}

impl WorkflowError {
    /// True for guard rejections that did not change any state.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            WorkflowError::InvalidTransition { .. }
                | WorkflowError::EmptyMeal
                | WorkflowError::UnknownIngredient(_)
                | WorkflowError::StaleTicket(_)
                | WorkflowError::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn capture_error_not_found_display() {
        let err = CaptureError::NotFound {
            path: PathBuf::from("/tmp/missing.jpg"),
        };
        let msg = err.to_string();
        assert!(msg.contains("Image not found"));
        assert!(msg.contains("/tmp/missing.jpg"));
    }

    #[test]
    fn capture_error_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: CaptureError = io_err.into();
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn analysis_error_display() {
        assert_eq!(
            AnalysisError::Network("timed out".to_string()).to_string(),
            "Network error: timed out"
        );
        assert_eq!(AnalysisError::Cancelled.to_string(), "Analysis cancelled");
    }

    #[test]
    fn submission_rejected_display_includes_status_when_known() {
        let remote = SubmissionError::Rejected {
            status: Some(409),
            message: "duplicate".to_string(),
        };
        assert_eq!(remote.to_string(), "Meal rejected (HTTP 409): duplicate");

        let local = SubmissionError::Rejected {
            status: None,
            message: "read-only".to_string(),
        };
        assert_eq!(local.to_string(), "Meal rejected: read-only");
    }

    #[test]
    fn validation_error_is_transparent_in_workflow_error() {
        let err: WorkflowError = ValidationError::EmptyName.into();
        assert_eq!(err.to_string(), "Ingredient name cannot be empty");
        assert!(err.is_rejection());
    }

    #[test]
    fn invalid_transition_display() {
        let err = WorkflowError::InvalidTransition {
            operation: Operation::Submit,
            status: Status::Analyzing,
        };
        assert_eq!(err.to_string(), "Cannot submit while analyzing");
        assert!(err.is_rejection());
    }

    #[test]
    fn surfaced_failures_are_not_rejections() {
        let err: WorkflowError = AnalysisError::Service("boom".to_string()).into();
        assert!(!err.is_rejection());
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn app_error_from_workflow_error() {
        let app: AppError = WorkflowError::EmptyMeal.into();
        assert!(app.to_string().contains("Workflow error"));
        assert!(app.to_string().contains("no ingredients"));
    }
}
