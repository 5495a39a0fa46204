//! External collaborators: the analysis service and the meal store.
//!
//! The coordinator never talks to these directly. The async driver in
//! [`crate::workflow`] calls them with the requests the coordinator hands
//! out and feeds the outcomes back.

pub mod http;
pub mod jsonl_store;
pub mod wire;

pub use http::{HttpAnalysisGateway, HttpMealStore};
pub use jsonl_store::JsonlMealStore;

use crate::model::{
    AnalysisError, AnalysisResult, CapturedImage, Language, MealRecord, PersistedId,
    SubmissionError,
};
use async_trait::async_trait;

/// AI nutrition estimation service.
///
/// Implementations must be safe to call repeatedly with the same image and
/// different hints; each call is independent.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// Estimate the contents of `image`.
    async fn analyze(
        &self,
        image: &CapturedImage,
        hint: Option<&str>,
        language: Language,
    ) -> Result<AnalysisResult, AnalysisError>;
}

/// Persistence for committed meals.
#[async_trait]
pub trait MealStore: Send + Sync {
    /// Persist `meal` and return its store-assigned id.
    ///
    /// A failed commit must leave no partial record behind.
    async fn commit(&self, meal: &MealRecord) -> Result<PersistedId, SubmissionError>;
}

#[async_trait]
impl<T: AnalysisGateway + ?Sized> AnalysisGateway for Box<T> {
    async fn analyze(
        &self,
        image: &CapturedImage,
        hint: Option<&str>,
        language: Language,
    ) -> Result<AnalysisResult, AnalysisError> {
        (**self).analyze(image, hint, language).await
    }
}

#[async_trait]
impl<T: MealStore + ?Sized> MealStore for Box<T> {
    async fn commit(&self, meal: &MealRecord) -> Result<PersistedId, SubmissionError> {
        (**self).commit(meal).await
    }
}
