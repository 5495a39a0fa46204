//! Workflow coordinator (pure state machine).
//!
//! Owns the single [`Session`] and the workflow status. Asynchronous
//! operations are split in two: a `begin_*` call performs the guard and the
//! "in flight" transition and hands out a request carrying a [`RequestTicket`];
//! the matching `complete_*` call accepts the outcome for that ticket. Nothing
//! here performs I/O; the async driver in [`crate::workflow`] runs the calls.
//!
//! ```text
//! idle --begin_capture--> capturing --image--> awaitingAnalysis
//! awaitingAnalysis --begin_analyze--> analyzing --ok--> editing
//!                                              \--err--> awaitingAnalysis
//! editing --begin_reanalyze--> reAnalyzing --ok|err--> editing
//! editing --begin_submission--> submitting --ok--> committed
//!                                          \--err--> editing
//! committed|failed --reset--> idle
//! ```

use crate::model::{
    AnalysisError, AnalysisResult, CaptureError, CapturedImage, Ingredient, IngredientDraft,
    IngredientId, IngredientPatch, Language, MealRecord, PersistedId, RequestTicket,
    SubmissionError, WorkflowError,
};
use crate::state::{Operation, Session, Status};
use tracing::{debug, warn};

/// Which analysis a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    /// First analysis of a session.
    Initial,
    /// Re-analysis of an already edited session.
    Refinement,
}

/// Everything the analysis gateway needs for one call.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Ticket to present with the outcome.
    pub ticket: RequestTicket,
    /// Initial analysis or re-analysis.
    pub kind: AnalysisKind,
    /// Image to analyse.
    pub image: CapturedImage,
    /// Optional free-text hint.
    pub hint: Option<String>,
    /// Locale for the service.
    pub language: Language,
}

/// Everything the meal store needs for one call.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    /// Ticket to present with the outcome.
    pub ticket: RequestTicket,
    /// Edited meal snapshot.
    pub meal: MealRecord,
}

/// Internal status with the data each state carries.
#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Capturing,
    AwaitingAnalysis,
    Analyzing(RequestTicket),
    Editing,
    ReAnalyzing(RequestTicket),
    Submitting(RequestTicket),
    Committed(PersistedId),
    Failed,
}

impl Phase {
    fn status(&self) -> Status {
        match self {
            Phase::Idle => Status::Idle,
            Phase::Capturing => Status::Capturing,
            Phase::AwaitingAnalysis => Status::AwaitingAnalysis,
            Phase::Analyzing(_) => Status::Analyzing,
            Phase::Editing => Status::Editing,
            Phase::ReAnalyzing(_) => Status::ReAnalyzing,
            Phase::Submitting(_) => Status::Submitting,
            Phase::Committed(_) => Status::Committed,
            Phase::Failed => Status::Failed,
        }
    }

    fn ticket(&self) -> Option<RequestTicket> {
        match self {
            Phase::Analyzing(t) | Phase::ReAnalyzing(t) | Phase::Submitting(t) => Some(*t),
            _ => None,
        }
    }
}

/// The capture→analyze→edit→submit state machine.
///
/// # Invariants
///
/// - A session exists exactly when [`Status::has_session`] holds.
/// - At most one ticket is in flight; only that ticket's outcome is accepted.
/// - Failures never discard edits; only a successful analysis replaces the
///   ingredient list and only a successful submission clears the session.
#[derive(Debug)]
pub struct WorkflowCoordinator {
    phase: Phase,
    session: Option<Session>,
    language: Language,
    last_error: Option<String>,
    next_ticket: u64,
}

impl WorkflowCoordinator {
    /// Idle coordinator that analyses in `language`.
    pub fn new(language: Language) -> Self {
        Self {
            phase: Phase::Idle,
            session: None,
            language,
            last_error: None,
            next_ticket: 1,
        }
    }

    // ===== Queries =====

    /// Current status.
    pub fn status(&self) -> Status {
        self.phase.status()
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Locale sent with analysis requests.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Message of the most recent surfaced failure.
    ///
    /// Cleared whenever a new operation begins.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Ticket of the call in flight.
    pub fn in_flight(&self) -> Option<RequestTicket> {
        self.phase.ticket()
    }

    /// Id of the meal persisted by the last successful submission, while
    /// the coordinator is in `committed`.
    pub fn committed_id(&self) -> Option<&PersistedId> {
        match &self.phase {
            Phase::Committed(id) => Some(id),
            _ => None,
        }
    }

    // ===== Acquisition =====

    /// Open an image source.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless idle.
    pub fn begin_capture(&mut self) -> Result<(), WorkflowError> {
        if !matches!(self.phase, Phase::Idle) {
            return Err(self.reject(Operation::Capture));
        }
        self.last_error = None;
        self.transition(Phase::Capturing);
        Ok(())
    }

    /// Accept the outcome of an image acquisition.
    ///
    /// A new image starts a session, or replaces the image of a session that
    /// has not been analysed yet. A failure before any session exists moves
    /// to `failed`; a failed retake keeps the existing session.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` outside idle, capturing and awaiting analysis.
    /// `Capture` when the acquisition itself failed.
    pub fn complete_capture(
        &mut self,
        outcome: Result<CapturedImage, CaptureError>,
    ) -> Result<(), WorkflowError> {
        if !matches!(
            self.phase,
            Phase::Idle | Phase::Capturing | Phase::AwaitingAnalysis
        ) {
            return Err(self.reject(Operation::AttachImage));
        }

        match outcome {
            Ok(image) => {
                self.last_error = None;
                match self.session.as_mut() {
                    Some(session) => {
                        debug!(bytes = image.len(), "Replacing session image");
                        session.replace_image(image);
                    }
                    None => {
                        debug!(bytes = image.len(), media_type = %image.media_type(), "Starting session");
                        self.session = Some(Session::new(image));
                    }
                }
                self.transition(Phase::AwaitingAnalysis);
                Ok(())
            }
            Err(error) => {
                self.surface(&error);
                if self.session.is_none() {
                    self.transition(Phase::Failed);
                }
                Err(error.into())
            }
        }
    }

    /// Attach an image picked without going through `capturing`.
    ///
    /// # Errors
    ///
    /// As [`complete_capture`](Self::complete_capture).
    pub fn attach_image(&mut self, image: CapturedImage) -> Result<(), WorkflowError> {
        self.complete_capture(Ok(image))
    }

    // ===== Comments =====

    /// Set the comment sent with the initial analysis.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` without a session or while a call is in flight.
    pub fn set_pre_comment(&mut self, text: impl Into<String>) -> Result<(), WorkflowError> {
        self.idle_session_mut(Operation::Comment)?.set_pre_comment(text);
        Ok(())
    }

    /// Set the comment sent with re-analysis and used as the description.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` without a session or while a call is in flight.
    pub fn set_post_comment(&mut self, text: impl Into<String>) -> Result<(), WorkflowError> {
        self.idle_session_mut(Operation::Comment)?.set_post_comment(text);
        Ok(())
    }

    // ===== Analysis =====

    /// Start the initial analysis.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless awaiting analysis.
    pub fn begin_analyze(&mut self) -> Result<AnalysisRequest, WorkflowError> {
        if !matches!(self.phase, Phase::AwaitingAnalysis) {
            return Err(self.reject(Operation::Analyze));
        }
        self.begin_analysis(AnalysisKind::Initial)
    }

    /// Start a re-analysis of the same image.
    ///
    /// A successful re-analysis replaces every ingredient, including ones the
    /// user added.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless editing.
    pub fn begin_reanalyze(&mut self) -> Result<AnalysisRequest, WorkflowError> {
        if !matches!(self.phase, Phase::Editing) {
            return Err(self.reject(Operation::ReAnalyze));
        }
        self.begin_analysis(AnalysisKind::Refinement)
    }

    fn begin_analysis(&mut self, kind: AnalysisKind) -> Result<AnalysisRequest, WorkflowError> {
        let Some(session) = self.session.as_ref() else {
            return Err(self.reject(match kind {
                AnalysisKind::Initial => Operation::Analyze,
                AnalysisKind::Refinement => Operation::ReAnalyze,
            }));
        };
        let hint = match kind {
            AnalysisKind::Initial => session.analysis_hint(),
            AnalysisKind::Refinement => session.reanalysis_hint(),
        };
        let image = session.image().clone();

        let ticket = self.issue_ticket();
        self.last_error = None;
        self.transition(match kind {
            AnalysisKind::Initial => Phase::Analyzing(ticket),
            AnalysisKind::Refinement => Phase::ReAnalyzing(ticket),
        });

        Ok(AnalysisRequest {
            ticket,
            kind,
            image,
            hint,
            language: self.language,
        })
    }

    /// Accept the outcome of an analysis call.
    ///
    /// On success the ingredient list is replaced and the session moves to
    /// editing. On failure an initial analysis returns to awaiting analysis
    /// and a re-analysis returns to editing with prior ingredients intact.
    ///
    /// # Errors
    ///
    /// `StaleTicket` when `ticket` is not the analysis in flight (nothing
    /// changes). `Analysis` when the call failed, after the failure
    /// transition has been applied.
    pub fn complete_analysis(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> Result<(), WorkflowError> {
        let failure_phase = match self.phase {
            Phase::Analyzing(current) if current == ticket => Phase::AwaitingAnalysis,
            Phase::ReAnalyzing(current) if current == ticket => Phase::Editing,
            _ => return Err(self.stale(ticket)),
        };

        match outcome {
            Ok(result) => {
                let Some(session) = self.session.as_mut() else {
                    return Err(self.stale(ticket));
                };
                debug!(%ticket, items = result.items.len(), "Analysis succeeded");
                session.apply_analysis(result);
                self.transition(Phase::Editing);
                Ok(())
            }
            Err(error) => {
                self.surface(&error);
                self.transition(failure_phase);
                Err(error.into())
            }
        }
    }

    // ===== Ingredient edits =====

    /// Add a user ingredient.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless editing; `Validation` for an empty name.
    pub fn add_ingredient(&mut self, draft: IngredientDraft) -> Result<IngredientId, WorkflowError> {
        let session = self.editing_session_mut()?;
        let id = session.add_ingredient(draft)?;
        debug!(%id, "Ingredient added");
        Ok(id)
    }

    /// Remove an ingredient. Absent ids are a no-op returning `None`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless editing.
    pub fn remove_ingredient(
        &mut self,
        id: &IngredientId,
    ) -> Result<Option<Ingredient>, WorkflowError> {
        let removed = self.editing_session_mut()?.remove_ingredient(id);
        debug!(%id, removed = removed.is_some(), "Ingredient removal");
        Ok(removed)
    }

    /// Patch fields of one ingredient.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless editing; `UnknownIngredient` or
    /// `Validation` from the edit itself.
    pub fn update_ingredient(
        &mut self,
        id: &IngredientId,
        patch: IngredientPatch,
    ) -> Result<(), WorkflowError> {
        self.editing_session_mut()?.update_ingredient(id, patch)?;
        debug!(%id, "Ingredient updated");
        Ok(())
    }

    // ===== Submission =====

    /// Start persisting the edited meal.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless editing; `EmptyMeal` when there are no
    /// ingredients.
    pub fn begin_submission(&mut self) -> Result<SubmissionRequest, WorkflowError> {
        if !matches!(self.phase, Phase::Editing) {
            return Err(self.reject(Operation::Submit));
        }
        let Some(session) = self.session.as_ref() else {
            return Err(self.reject(Operation::Submit));
        };
        if session.ingredients().is_empty() {
            return Err(WorkflowError::EmptyMeal);
        }
        let meal = session.to_meal_record(self.language);

        let ticket = self.issue_ticket();
        self.last_error = None;
        self.transition(Phase::Submitting(ticket));
        Ok(SubmissionRequest { ticket, meal })
    }

    /// Accept the outcome of a submission.
    ///
    /// Success clears the session and moves to committed. Failure returns to
    /// editing with the session untouched.
    ///
    /// # Errors
    ///
    /// `StaleTicket` when `ticket` is not the submission in flight.
    /// `Submission` when the store failed, after returning to editing.
    pub fn complete_submission(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<PersistedId, SubmissionError>,
    ) -> Result<PersistedId, WorkflowError> {
        if !matches!(self.phase, Phase::Submitting(current) if current == ticket) {
            return Err(self.stale(ticket));
        }

        match outcome {
            Ok(id) => {
                debug!(%ticket, meal_id = %id, "Submission succeeded");
                self.session = None;
                self.transition(Phase::Committed(id.clone()));
                Ok(id)
            }
            Err(error) => {
                self.surface(&error);
                self.transition(Phase::Editing);
                Err(error.into())
            }
        }
    }

    // ===== Cancellation and reset =====

    /// Abandon the call in flight, applying its failure transition.
    ///
    /// Returns the cancelled ticket; any later outcome for it is stale.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when nothing is in flight.
    pub fn cancel(&mut self) -> Result<RequestTicket, WorkflowError> {
        let (ticket, next) = match self.phase {
            Phase::Analyzing(t) => {
                self.surface(&AnalysisError::Cancelled);
                (t, Phase::AwaitingAnalysis)
            }
            Phase::ReAnalyzing(t) => {
                self.surface(&AnalysisError::Cancelled);
                (t, Phase::Editing)
            }
            Phase::Submitting(t) => {
                self.surface(&SubmissionError::Cancelled);
                (t, Phase::Editing)
            }
            _ => return Err(self.reject(Operation::Cancel)),
        };
        self.transition(next);
        Ok(ticket)
    }

    /// Drop the session and return to idle.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` while a call is in flight.
    pub fn discard(&mut self) -> Result<(), WorkflowError> {
        if self.status().is_busy() {
            return Err(self.reject(Operation::Discard));
        }
        self.session = None;
        self.last_error = None;
        self.transition(Phase::Idle);
        Ok(())
    }

    /// Leave `committed` or `failed` for idle.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` from any other status.
    pub fn reset(&mut self) -> Result<(), WorkflowError> {
        if !self.status().is_terminal() {
            return Err(self.reject(Operation::Reset));
        }
        self.last_error = None;
        self.transition(Phase::Idle);
        Ok(())
    }

    // ===== Internals =====

    fn transition(&mut self, next: Phase) {
        debug!(from = %self.phase.status(), to = %next.status(), "Workflow transition");
        self.phase = next;
    }

    fn issue_ticket(&mut self) -> RequestTicket {
        let ticket = RequestTicket::new(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    fn reject(&self, operation: Operation) -> WorkflowError {
        let status = self.status();
        debug!(%operation, %status, "Operation rejected");
        WorkflowError::InvalidTransition { operation, status }
    }

    fn stale(&self, ticket: RequestTicket) -> WorkflowError {
        debug!(%ticket, in_flight = ?self.phase.ticket(), "Ignoring stale outcome");
        WorkflowError::StaleTicket(ticket)
    }

    fn surface(&mut self, error: &dyn std::error::Error) {
        warn!(status = %self.status(), error = %error, "Operation failed");
        self.last_error = Some(error.to_string());
    }

    fn idle_session_mut(&mut self, operation: Operation) -> Result<&mut Session, WorkflowError> {
        if self.status().is_busy() {
            return Err(self.reject(operation));
        }
        match self.session.as_mut() {
            Some(session) => Ok(session),
            None => Err(WorkflowError::InvalidTransition {
                operation,
                status: self.phase.status(),
            }),
        }
    }

    fn editing_session_mut(&mut self) -> Result<&mut Session, WorkflowError> {
        if !matches!(self.phase, Phase::Editing) {
            return Err(self.reject(Operation::EditIngredients));
        }
        match self.session.as_mut() {
            Some(session) => Ok(session),
            None => Err(WorkflowError::InvalidTransition {
                operation: Operation::EditIngredients,
                status: Status::Editing,
            }),
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
