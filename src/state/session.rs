//! The pending meal: the single aggregate root of a workflow run.

use crate::model::{
    AnalysisResult, CapturedImage, Ingredient, IngredientDraft, IngredientId, IngredientPatch,
    Language, MealItem, MealRecord, NutritionTotals, ValidationError, WorkflowError,
    DEFAULT_MEAL_NAME,
};
use crate::state::aggregator;
use crate::state::IngredientEditor;
use chrono::Utc;

/// One capture-analyze-edit-submit unit of work.
///
/// # Invariants
///
/// `totals` always equals [`aggregator::recompute`] over the ingredient list.
/// Every mutating method refreshes it before returning; there is no setter.
#[derive(Debug, Clone)]
pub struct Session {
    image: CapturedImage,
    pre_comment: String,
    post_comment: String,
    latest_analysis: Option<AnalysisResult>,
    editor: IngredientEditor,
    totals: NutritionTotals,
}

impl Session {
    /// Start a session around a freshly acquired image.
    pub fn new(image: CapturedImage) -> Self {
        Self {
            image,
            pre_comment: String::new(),
            post_comment: String::new(),
            latest_analysis: None,
            editor: IngredientEditor::new(),
            totals: NutritionTotals::default(),
        }
    }

    /// The source image.
    pub fn image(&self) -> &CapturedImage {
        &self.image
    }

    /// Comment written before the first analysis.
    pub fn pre_comment(&self) -> &str {
        &self.pre_comment
    }

    /// Comment written after an analysis, used for re-analysis and as the
    /// meal description.
    pub fn post_comment(&self) -> &str {
        &self.post_comment
    }

    /// The most recent successful analysis.
    pub fn latest_analysis(&self) -> Option<&AnalysisResult> {
        self.latest_analysis.as_ref()
    }

    /// Ingredients in display order.
    pub fn ingredients(&self) -> &[Ingredient] {
        self.editor.items()
    }

    /// Look up one ingredient.
    pub fn ingredient(&self, id: &IngredientId) -> Option<&Ingredient> {
        self.editor.get(id)
    }

    /// Current totals over all ingredients.
    pub fn totals(&self) -> NutritionTotals {
        self.totals
    }

    pub(crate) fn replace_image(&mut self, image: CapturedImage) {
        self.image = image;
    }

    pub(crate) fn set_pre_comment(&mut self, text: impl Into<String>) {
        self.pre_comment = text.into();
    }

    pub(crate) fn set_post_comment(&mut self, text: impl Into<String>) {
        self.post_comment = text.into();
    }

    /// Hint for the initial analysis: the trimmed pre comment, if any.
    pub fn analysis_hint(&self) -> Option<String> {
        non_blank(&self.pre_comment)
    }

    /// Hint for a re-analysis: the trimmed post comment, if any.
    pub fn reanalysis_hint(&self) -> Option<String> {
        non_blank(&self.post_comment)
    }

    pub(crate) fn add_ingredient(
        &mut self,
        draft: IngredientDraft,
    ) -> Result<IngredientId, ValidationError> {
        let id = self.editor.add(draft)?.id.clone();
        self.refresh_totals();
        Ok(id)
    }

    pub(crate) fn remove_ingredient(&mut self, id: &IngredientId) -> Option<Ingredient> {
        let removed = self.editor.remove(id);
        self.refresh_totals();
        removed
    }

    pub(crate) fn update_ingredient(
        &mut self,
        id: &IngredientId,
        patch: IngredientPatch,
    ) -> Result<(), WorkflowError> {
        self.editor.update(id, patch)?;
        self.refresh_totals();
        Ok(())
    }

    /// Replace the latest analysis and the whole ingredient list.
    pub(crate) fn apply_analysis(&mut self, result: AnalysisResult) {
        self.editor.replace_from_analysis(&result);
        self.latest_analysis = Some(result);
        self.refresh_totals();
    }

    /// Snapshot the edited meal for submission.
    ///
    /// Totals come from the edited ingredient list, never from the analysis.
    pub fn to_meal_record(&self, language: Language) -> MealRecord {
        let analysis = self.latest_analysis.as_ref();
        let meal_name = analysis
            .and_then(|a| a.meal_name.as_deref())
            .and_then(non_blank)
            .unwrap_or_else(|| DEFAULT_MEAL_NAME.to_string());
        let description = non_blank(&self.post_comment).or_else(|| {
            analysis
                .and_then(|a| a.description.as_deref())
                .and_then(non_blank)
        });

        MealRecord {
            meal_name,
            description,
            language,
            totals: self.totals,
            items: self.editor.items().iter().map(MealItem::from).collect(),
            source_analysis_totals: analysis.map(|a| a.totals),
            created_at: Utc::now(),
            image: Some(self.image.clone()),
        }
    }

    fn refresh_totals(&mut self) {
        self.totals = aggregator::recompute(self.editor.items());
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
