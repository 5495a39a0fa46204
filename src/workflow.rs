//! Async driver (impure shell around the coordinator).
//!
//! [`Workflow`] owns a [`WorkflowCoordinator`] together with the analysis
//! gateway and the meal store. Each async operation asks the coordinator for
//! a request, runs the external call under a timeout and a cancellation
//! signal, and hands the outcome back. The coordinator stays the only place
//! where state changes.

use crate::gateway::{AnalysisGateway, MealStore};
use crate::model::{AnalysisError, PersistedId, SubmissionError, WorkflowError};
use crate::source::ImageSource;
use crate::state::{AnalysisRequest, Operation, Status, WorkflowCoordinator};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{info, info_span, Instrument};

/// Per-call time limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Limit for one analysis call.
    pub analysis: Duration,
    /// Limit for one submission call.
    pub submission: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            analysis: Duration::from_secs(60),
            submission: Duration::from_secs(30),
        }
    }
}

/// Cancels the external call currently in flight.
///
/// Cheap to clone and safe to move into a signal handler task.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    notify: Arc<Notify>,
    in_flight: Arc<AtomicBool>,
}

impl CancelHandle {
    /// New handle with nothing in flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the call in flight to stop.
    ///
    /// Returns `false` when nothing is in flight.
    pub fn cancel(&self) -> bool {
        if !self.in_flight.load(Ordering::SeqCst) {
            return false;
        }
        self.notify.notify_waiters();
        true
    }

    /// Whether an external call is running.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn arm(&self) -> InFlight<'_> {
        self.in_flight.store(true, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

enum Raced<T> {
    Done(T),
    TimedOut,
    Cancelled,
}

/// Run `call` until it completes, `limit` elapses, or `cancel` fires.
async fn race<F: Future>(call: F, limit: Duration, cancel: &CancelHandle) -> Raced<F::Output> {
    // Register interest before publishing in_flight so no cancel is missed.
    let notified = cancel.notify.notified();
    tokio::pin!(notified);
    notified.as_mut().enable();
    let _in_flight = cancel.arm();

    tokio::select! {
        biased;
        _ = &mut notified => Raced::Cancelled,
        result = tokio::time::timeout(limit, call) => match result {
            Ok(output) => Raced::Done(output),
            Err(_) => Raced::TimedOut,
        },
    }
}

/// Drives one workflow against real collaborators.
pub struct Workflow<G, S> {
    coordinator: WorkflowCoordinator,
    gateway: G,
    store: S,
    timeouts: Timeouts,
    cancel: CancelHandle,
}

impl<G: AnalysisGateway, S: MealStore> Workflow<G, S> {
    /// Wrap `coordinator` with its collaborators.
    pub fn new(coordinator: WorkflowCoordinator, gateway: G, store: S, timeouts: Timeouts) -> Self {
        Self {
            coordinator,
            gateway,
            store,
            timeouts,
            cancel: CancelHandle::new(),
        }
    }

    /// Read-only view of the state machine.
    pub fn coordinator(&self) -> &WorkflowCoordinator {
        &self.coordinator
    }

    /// Mutable access for synchronous operations (edits, comments, discard).
    pub fn coordinator_mut(&mut self) -> &mut WorkflowCoordinator {
        &mut self.coordinator
    }

    /// The analysis gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The meal store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle that cancels whichever call is in flight.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Take a photo with `source` and start (or refresh) the session.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` unless idle; `Capture` when the source fails.
    pub async fn capture(&mut self, source: &dyn ImageSource) -> Result<(), WorkflowError> {
        self.coordinator.begin_capture()?;
        let outcome = source.capture().await;
        self.coordinator.complete_capture(outcome)
    }

    /// Pick a photo with `source`. Also replaces the image of a session that
    /// has not been analysed yet.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` once analysis has started; `Capture` when the
    /// source fails.
    pub async fn pick(&mut self, source: &dyn ImageSource) -> Result<(), WorkflowError> {
        let status = self.coordinator.status();
        if !matches!(status, Status::Idle | Status::AwaitingAnalysis) {
            return Err(WorkflowError::InvalidTransition {
                operation: Operation::AttachImage,
                status,
            });
        }
        let outcome = source.pick().await;
        self.coordinator.complete_capture(outcome)
    }

    /// Run the initial analysis.
    ///
    /// # Errors
    ///
    /// Guard rejections from the coordinator, or `Analysis` after the
    /// failure transition (network, service, invalid image, timeout,
    /// cancellation).
    pub async fn analyze(&mut self) -> Result<(), WorkflowError> {
        let request = self.coordinator.begin_analyze()?;
        self.run_analysis(request).await
    }

    /// Re-run analysis with the post-analysis comment as hint.
    ///
    /// # Errors
    ///
    /// As [`analyze`](Self::analyze); on failure prior ingredients are kept.
    pub async fn reanalyze(&mut self) -> Result<(), WorkflowError> {
        let request = self.coordinator.begin_reanalyze()?;
        self.run_analysis(request).await
    }

    async fn run_analysis(&mut self, request: AnalysisRequest) -> Result<(), WorkflowError> {
        let ticket = request.ticket;
        let limit = self.timeouts.analysis;
        let span = info_span!("analysis", %ticket, kind = ?request.kind, language = %request.language);
        let started = Instant::now();

        let call = self
            .gateway
            .analyze(&request.image, request.hint.as_deref(), request.language);
        let raced = race(call, limit, &self.cancel).instrument(span.clone()).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let outcome = match raced {
            Raced::Done(outcome) => outcome,
            Raced::TimedOut => Err(AnalysisError::Network(format!(
                "analysis timed out after {}s",
                limit.as_secs()
            ))),
            Raced::Cancelled => {
                span.in_scope(|| info!(elapsed_ms, "Analysis cancelled"));
                self.coordinator.cancel()?;
                return Err(AnalysisError::Cancelled.into());
            }
        };
        span.in_scope(|| info!(elapsed_ms, ok = outcome.is_ok(), "Analysis finished"));
        self.coordinator.complete_analysis(ticket, outcome)
    }

    /// Persist the edited meal.
    ///
    /// # Errors
    ///
    /// Guard rejections (`InvalidTransition`, `EmptyMeal`), or `Submission`
    /// after returning to editing.
    pub async fn submit(&mut self) -> Result<PersistedId, WorkflowError> {
        let request = self.coordinator.begin_submission()?;
        let ticket = request.ticket;
        let limit = self.timeouts.submission;
        let span = info_span!("submission", %ticket, items = request.meal.items.len());
        let started = Instant::now();

        let raced = race(self.store.commit(&request.meal), limit, &self.cancel)
            .instrument(span.clone())
            .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let outcome = match raced {
            Raced::Done(outcome) => outcome,
            Raced::TimedOut => Err(SubmissionError::Network(format!(
                "submission timed out after {}s",
                limit.as_secs()
            ))),
            Raced::Cancelled => {
                span.in_scope(|| info!(elapsed_ms, "Submission cancelled"));
                self.coordinator.cancel()?;
                return Err(SubmissionError::Cancelled.into());
            }
        };
        span.in_scope(|| info!(elapsed_ms, ok = outcome.is_ok(), "Submission finished"));
        self.coordinator.complete_submission(ticket, outcome)
    }
}
