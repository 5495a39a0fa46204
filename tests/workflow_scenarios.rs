//! Integration tests: end-to-end workflow scenarios against scripted
//! collaborators.

use async_trait::async_trait;
use mealsnap::gateway::{AnalysisGateway, MealStore};
use mealsnap::model::{
    Amount, AnalysisError, AnalysisResult, AnalyzedItem, CapturedImage, ImageOrigin,
    IngredientDraft, Language, MealRecord, NutritionTotals, PersistedId, Provenance,
    SubmissionError, WorkflowError,
};
use mealsnap::source::{FilePicker, LocalImageSource};
use mealsnap::state::{Status, WorkflowCoordinator};
use mealsnap::workflow::{Timeouts, Workflow};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

// ===== Scripted collaborators =====

enum Reply {
    Estimate(AnalysisResult),
    Fail(AnalysisError),
    Hang,
}

#[derive(Default)]
struct ScriptedGateway {
    replies: Mutex<VecDeque<Reply>>,
    hints: Mutex<Vec<Option<String>>>,
}

impl ScriptedGateway {
    fn with(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            hints: Mutex::default(),
        }
    }
}

#[async_trait]
impl AnalysisGateway for ScriptedGateway {
    async fn analyze(
        &self,
        _image: &CapturedImage,
        hint: Option<&str>,
        _language: Language,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.hints.lock().unwrap().push(hint.map(str::to_string));
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Estimate(result)) => Ok(result),
            Some(Reply::Fail(error)) => Err(error),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(AnalysisError::Service("no scripted reply".to_string())),
        }
    }
}

#[derive(Default)]
struct RecordingStore {
    failures_left: Mutex<u32>,
    hang: bool,
    attempts: Mutex<Vec<MealRecord>>,
}

impl RecordingStore {
    fn failing(times: u32) -> Self {
        Self {
            failures_left: Mutex::new(times),
            ..Self::default()
        }
    }

    /// Store whose commits never complete.
    fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MealStore for RecordingStore {
    async fn commit(&self, meal: &MealRecord) -> Result<PersistedId, SubmissionError> {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push(meal.clone());
            attempts.len()
        };
        if self.hang {
            return std::future::pending().await;
        }
        let mut failures_left = self.failures_left.lock().unwrap();
        if *failures_left > 0 {
            *failures_left -= 1;
            return Err(SubmissionError::Network("connection reset".to_string()));
        }
        Ok(PersistedId::new(format!("meal-{attempt}")).unwrap())
    }
}

// ===== Helpers =====

fn item(name: &str, cal: u32, p: u32, c: u32, f: u32) -> AnalyzedItem {
    AnalyzedItem::macros(
        name,
        Amount::whole(cal),
        Amount::whole(p),
        Amount::whole(c),
        Amount::whole(f),
    )
}

fn estimate(items: Vec<AnalyzedItem>) -> AnalysisResult {
    AnalysisResult {
        meal_name: Some("Lunch".to_string()),
        description: Some("Rice bowl".to_string()),
        items,
        totals: NutritionTotals {
            calories: Amount::whole(999),
            ..NutritionTotals::default()
        },
    }
}

fn two_item_estimate() -> AnalysisResult {
    estimate(vec![item("Rice", 100, 5, 10, 2), item("Chicken", 200, 10, 20, 5)])
}

fn workflow(
    gateway: ScriptedGateway,
    store: RecordingStore,
    timeouts: Timeouts,
) -> Workflow<ScriptedGateway, RecordingStore> {
    let mut coordinator = WorkflowCoordinator::new(Language::Hebrew);
    let image = CapturedImage::from_bytes(JPEG, ImageOrigin::Camera).unwrap();
    coordinator.attach_image(image).unwrap();
    Workflow::new(coordinator, gateway, store, timeouts)
}

fn ingredient_names(workflow: &Workflow<ScriptedGateway, RecordingStore>) -> Vec<String> {
    workflow
        .coordinator()
        .session()
        .map(|s| s.ingredients().iter().map(|i| i.name.clone()).collect())
        .unwrap_or_default()
}

// ===== Scenarios =====

#[tokio::test]
async fn picked_image_is_analysed_and_totals_are_summed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lunch.jpg");
    std::fs::write(&path, JPEG).unwrap();
    let source = LocalImageSource::new(None, Some(FilePicker::new(&path)));

    let mut workflow = Workflow::new(
        WorkflowCoordinator::new(Language::English),
        ScriptedGateway::with(vec![Reply::Estimate(two_item_estimate())]),
        RecordingStore::default(),
        Timeouts::default(),
    );

    workflow.pick(&source).await.unwrap();
    assert_eq!(workflow.coordinator().status(), Status::AwaitingAnalysis);

    workflow.analyze().await.unwrap();
    let totals = workflow.coordinator().session().unwrap().totals();
    assert_eq!(totals.calories, Amount::whole(300));
    assert_eq!(totals.protein_g, Amount::whole(15));
    assert_eq!(totals.carbs_g, Amount::whole(30));
    assert_eq!(totals.fat_g, Amount::whole(7));
}

#[tokio::test]
async fn reanalysis_replaces_user_additions() {
    let gateway = ScriptedGateway::with(vec![
        Reply::Estimate(two_item_estimate()),
        Reply::Estimate(estimate(vec![item("Brown rice", 110, 3, 23, 1)])),
    ]);
    let mut workflow = workflow(gateway, RecordingStore::default(), Timeouts::default());

    workflow.analyze().await.unwrap();
    workflow
        .coordinator_mut()
        .add_ingredient(IngredientDraft::named("Soy sauce").macros("10", "1", "1", "0"))
        .unwrap();
    workflow
        .coordinator_mut()
        .set_post_comment("  the rice was brown  ")
        .unwrap();

    workflow.reanalyze().await.unwrap();

    assert_eq!(ingredient_names(&workflow), vec!["Brown rice".to_string()]);
    let session = workflow.coordinator().session().unwrap();
    assert!(session
        .ingredients()
        .iter()
        .all(|i| i.provenance == Provenance::Ai));
    assert_eq!(session.totals().calories, Amount::whole(110));

    let hints = workflow.gateway().hints.lock().unwrap().clone();
    assert_eq!(hints, vec![None, Some("the rice was brown".to_string())]);
}

#[tokio::test]
async fn submit_is_gated_and_commits_edited_totals() {
    let gateway = ScriptedGateway::with(vec![
        Reply::Estimate(estimate(Vec::new())),
        Reply::Estimate(two_item_estimate()),
    ]);
    let mut workflow = workflow(gateway, RecordingStore::default(), Timeouts::default());

    let err = workflow.submit().await.unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidTransition { .. }));

    workflow.analyze().await.unwrap();
    let err = workflow.submit().await.unwrap_err();
    assert!(matches!(err, WorkflowError::EmptyMeal));
    assert_eq!(workflow.coordinator().status(), Status::Editing);

    workflow.reanalyze().await.unwrap();
    let rice = workflow.coordinator().session().unwrap().ingredients()[0]
        .id
        .clone();
    workflow.coordinator_mut().remove_ingredient(&rice).unwrap();

    let id = workflow.submit().await.unwrap();
    assert_eq!(id.as_str(), "meal-1");
    assert_eq!(workflow.coordinator().status(), Status::Committed);
    assert_eq!(workflow.coordinator().committed_id(), Some(&id));
    assert!(workflow.coordinator().session().is_none());

    let attempts = workflow.store().attempts.lock().unwrap();
    let meal = &attempts[0];
    assert_eq!(meal.totals.calories, Amount::whole(200));
    assert_eq!(meal.totals.fat_g, Amount::whole(5));
    assert_eq!(
        meal.source_analysis_totals.map(|t| t.calories),
        Some(Amount::whole(999))
    );
    assert_eq!(meal.meal_name, "Lunch");
    assert_eq!(meal.language, Language::Hebrew);
    assert!(meal.image.is_some());
}

#[tokio::test]
async fn network_failure_keeps_image_and_creates_nothing() {
    let gateway = ScriptedGateway::with(vec![Reply::Fail(AnalysisError::Network(
        "unreachable".to_string(),
    ))]);
    let mut workflow = workflow(gateway, RecordingStore::default(), Timeouts::default());

    let err = workflow.analyze().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Analysis(AnalysisError::Network(_))
    ));

    let coordinator = workflow.coordinator();
    assert_eq!(coordinator.status(), Status::AwaitingAnalysis);
    let session = coordinator.session().unwrap();
    assert_eq!(session.image().bytes().as_ref(), JPEG);
    assert!(session.ingredients().is_empty());
    assert!(coordinator.last_error().unwrap().contains("unreachable"));
}

#[tokio::test(start_paused = true)]
async fn analysis_timeout_surfaces_network_error() {
    let timeouts = Timeouts {
        analysis: Duration::from_secs(5),
        submission: Duration::from_secs(5),
    };
    let gateway = ScriptedGateway::with(vec![Reply::Hang, Reply::Estimate(two_item_estimate())]);
    let mut workflow = workflow(gateway, RecordingStore::default(), timeouts);

    let err = workflow.analyze().await.unwrap_err();
    match err {
        WorkflowError::Analysis(AnalysisError::Network(message)) => {
            assert!(message.contains("timed out after 5s"), "{message}");
        }
        other => panic!("expected network timeout, got {other:?}"),
    }
    assert_eq!(workflow.coordinator().status(), Status::AwaitingAnalysis);
    assert!(!workflow.cancel_handle().is_in_flight());

    workflow.analyze().await.unwrap();
    assert_eq!(workflow.coordinator().status(), Status::Editing);
}

#[tokio::test(start_paused = true)]
async fn cancelled_reanalysis_keeps_edits() {
    let gateway = ScriptedGateway::with(vec![Reply::Estimate(two_item_estimate()), Reply::Hang]);
    let mut workflow = workflow(gateway, RecordingStore::default(), Timeouts::default());

    workflow.analyze().await.unwrap();
    workflow
        .coordinator_mut()
        .add_ingredient(IngredientDraft::named("Pickles"))
        .unwrap();

    let cancel = workflow.cancel_handle();
    let canceller = tokio::spawn(async move {
        while !cancel.cancel() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    });

    let err = workflow.reanalyze().await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(
        err,
        WorkflowError::Analysis(AnalysisError::Cancelled)
    ));
    assert_eq!(workflow.coordinator().status(), Status::Editing);
    assert_eq!(
        ingredient_names(&workflow),
        vec!["Rice".to_string(), "Chicken".to_string(), "Pickles".to_string()]
    );
    assert_eq!(
        workflow.coordinator().last_error(),
        Some("Analysis cancelled")
    );
}

#[test]
fn late_outcome_for_cancelled_ticket_is_stale() {
    let mut coordinator = WorkflowCoordinator::new(Language::English);
    let image = CapturedImage::from_bytes(JPEG, ImageOrigin::Gallery).unwrap();
    coordinator.attach_image(image).unwrap();
    let first = coordinator.begin_analyze().unwrap();
    coordinator
        .complete_analysis(first.ticket, Ok(two_item_estimate()))
        .unwrap();

    let request = coordinator.begin_reanalyze().unwrap();
    assert_eq!(coordinator.cancel().unwrap(), request.ticket);

    let err = coordinator
        .complete_analysis(request.ticket, Ok(estimate(Vec::new())))
        .unwrap_err();
    assert!(matches!(err, WorkflowError::StaleTicket(t) if t == request.ticket));
    assert_eq!(coordinator.status(), Status::Editing);
    assert_eq!(coordinator.session().unwrap().ingredients().len(), 2);
}

#[tokio::test]
async fn failed_submission_can_be_retried() {
    let gateway = ScriptedGateway::with(vec![Reply::Estimate(two_item_estimate())]);
    let mut workflow = workflow(gateway, RecordingStore::failing(1), Timeouts::default());

    workflow.analyze().await.unwrap();

    let err = workflow.submit().await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::Submission(SubmissionError::Network(_))
    ));
    assert_eq!(workflow.coordinator().status(), Status::Editing);
    assert_eq!(ingredient_names(&workflow).len(), 2);

    let id = workflow.submit().await.unwrap();
    assert_eq!(id.as_str(), "meal-2");

    let attempts = workflow.store().attempts.lock().unwrap();
    assert_eq!(attempts.len(), 2);
    assert_eq!(attempts[0].items, attempts[1].items);
    assert_eq!(attempts[0].totals, attempts[1].totals);
    assert_eq!(attempts[0].meal_name, attempts[1].meal_name);
}

#[tokio::test(start_paused = true)]
async fn submission_timeout_keeps_session() {
    let timeouts = Timeouts {
        analysis: Duration::from_secs(5),
        submission: Duration::from_secs(5),
    };
    let gateway = ScriptedGateway::with(vec![Reply::Estimate(two_item_estimate())]);
    let mut workflow = workflow(gateway, RecordingStore::hanging(), timeouts);

    workflow.analyze().await.unwrap();
    let err = workflow.submit().await.unwrap_err();

    match err {
        WorkflowError::Submission(SubmissionError::Network(message)) => {
            assert!(message.contains("timed out after 5s"), "{message}");
        }
        other => panic!("expected network timeout, got {other:?}"),
    }
    assert_eq!(workflow.coordinator().status(), Status::Editing);
    assert_eq!(
        ingredient_names(&workflow),
        vec!["Rice".to_string(), "Chicken".to_string()]
    );
    assert!(!workflow.cancel_handle().is_in_flight());
    assert_eq!(workflow.store().attempts.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancelled_submission_keeps_session() {
    let gateway = ScriptedGateway::with(vec![Reply::Estimate(two_item_estimate())]);
    let mut workflow = workflow(gateway, RecordingStore::hanging(), Timeouts::default());

    workflow.analyze().await.unwrap();
    workflow
        .coordinator_mut()
        .add_ingredient(IngredientDraft::named("Pickles"))
        .unwrap();

    let cancel = workflow.cancel_handle();
    let canceller = tokio::spawn(async move {
        while !cancel.cancel() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    });

    let err = workflow.submit().await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(
        err,
        WorkflowError::Submission(SubmissionError::Cancelled)
    ));
    assert_eq!(workflow.coordinator().status(), Status::Editing);
    assert_eq!(
        ingredient_names(&workflow),
        vec!["Rice".to_string(), "Chicken".to_string(), "Pickles".to_string()]
    );
    assert!(!workflow.cancel_handle().is_in_flight());
}
