//! Domain model types (pure).
//!
//! All types in this module are pure data with smart constructors.

pub mod amount;
pub mod analysis;
pub mod error;
pub mod identifiers;
pub mod image;
pub mod meal;
pub mod nutrition;

// Re-export for convenience
pub use amount::Amount;
pub use analysis::{AnalysisResult, AnalyzedItem, Language, UnknownLanguage};
pub use error::{
    AnalysisError, AppError, CaptureError, SubmissionError, ValidationError, WorkflowError,
};
pub use identifiers::{
    IngredientId, InvalidIngredientId, InvalidPersistedId, PersistedId, RequestTicket,
};
pub use image::{CapturedImage, ImageOrigin, MediaType};
pub use meal::{MealItem, MealRecord, DEFAULT_MEAL_NAME};
pub use nutrition::{IngredientDraft, IngredientPatch, Ingredient, NutritionTotals, Provenance};
