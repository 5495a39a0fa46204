//! Workflow status and the operations that drive it.

use std::fmt;

/// Status of the workflow.
///
/// One value replaces the separate "camera open", "analyzing", "editing" and
/// "posting" flags, so combinations such as analyzing-while-submitting cannot
/// be represented.
///
/// # Cardinality
/// - No session: `Idle`, `Capturing`, `Committed`, `Failed`
/// - Session present: `AwaitingAnalysis`, `Analyzing`, `Editing`, `ReAnalyzing`, `Submitting`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// No session; ready to acquire an image.
    Idle,
    /// An image source is open.
    Capturing,
    /// An image is held; analysis not yet run (or the last attempt failed).
    AwaitingAnalysis,
    /// Initial analysis in flight.
    Analyzing,
    /// Ingredients seeded; the user may edit, re-analyze or submit.
    Editing,
    /// Re-analysis in flight.
    ReAnalyzing,
    /// Submission in flight.
    Submitting,
    /// The meal was persisted and the session cleared.
    Committed,
    /// Acquisition failed before a session existed.
    Failed,
}

impl Status {
    /// True while an analysis or submission call is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Status::Analyzing | Status::ReAnalyzing | Status::Submitting
        )
    }

    /// True when a session exists in this status.
    pub fn has_session(self) -> bool {
        matches!(
            self,
            Status::AwaitingAnalysis
                | Status::Analyzing
                | Status::Editing
                | Status::ReAnalyzing
                | Status::Submitting
        )
    }

    /// True for the end-of-session states that only `reset` leaves.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Committed | Status::Failed)
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Capturing => "capturing",
            Status::AwaitingAnalysis => "awaiting analysis",
            Status::Analyzing => "analyzing",
            Status::Editing => "editing",
            Status::ReAnalyzing => "re-analyzing",
            Status::Submitting => "submitting",
            Status::Committed => "committed",
            Status::Failed => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Caller-initiated operations, used in rejection errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Open an image source.
    Capture,
    /// Attach an acquired image.
    AttachImage,
    /// Start the initial analysis.
    Analyze,
    /// Start a re-analysis.
    ReAnalyze,
    /// Add, remove or update an ingredient.
    EditIngredients,
    /// Set a comment.
    Comment,
    /// Start a submission.
    Submit,
    /// Cancel the in-flight call.
    Cancel,
    /// Drop the session.
    Discard,
    /// Return to idle after commit or failure.
    Reset,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operation::Capture => "capture",
            Operation::AttachImage => "attach an image",
            Operation::Analyze => "analyze",
            Operation::ReAnalyze => "re-analyze",
            Operation::EditIngredients => "edit ingredients",
            Operation::Comment => "set a comment",
            Operation::Submit => "submit",
            Operation::Cancel => "cancel",
            Operation::Discard => "discard",
            Operation::Reset => "reset",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Status; 9] = [
        Status::Idle,
        Status::Capturing,
        Status::AwaitingAnalysis,
        Status::Analyzing,
        Status::Editing,
        Status::ReAnalyzing,
        Status::Submitting,
        Status::Committed,
        Status::Failed,
    ];

    #[test]
    fn busy_states_always_have_a_session() {
        for status in ALL {
            if status.is_busy() {
                assert!(status.has_session(), "{status} is busy without a session");
            }
        }
    }

    #[test]
    fn terminal_states_have_no_session() {
        for status in ALL.into_iter().filter(|s| s.is_terminal()) {
            assert!(!status.has_session());
            assert!(!status.is_busy());
        }
    }

    #[test]
    fn exactly_three_busy_states() {
        let busy: Vec<_> = ALL.into_iter().filter(|s| s.is_busy()).collect();
        assert_eq!(
            busy,
            vec![Status::Analyzing, Status::ReAnalyzing, Status::Submitting]
        );
    }

    #[test]
    fn display_uses_labels() {
        assert_eq!(Status::AwaitingAnalysis.to_string(), "awaiting analysis");
        assert_eq!(Operation::ReAnalyze.to_string(), "re-analyze");
    }
}
