//! Workflow state machine (pure).
//!
//! All state transitions are pure functions testable without any I/O.

pub mod aggregator;
pub mod coordinator;
pub mod editor;
pub mod session;
pub mod status;

// Re-export for convenience
pub use aggregator::recompute;
pub use coordinator::{AnalysisKind, AnalysisRequest, SubmissionRequest, WorkflowCoordinator};
pub use editor::IngredientEditor;
pub use session::Session;
pub use status::{Operation, Status};
