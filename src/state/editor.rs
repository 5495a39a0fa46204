//! Ingredient list editing.

use crate::model::{
    Amount, AnalysisResult, Ingredient, IngredientDraft, IngredientId, IngredientPatch,
    Provenance, ValidationError, WorkflowError,
};

const AI_PREFIX: &str = "ai";
const USER_PREFIX: &str = "user";

/// Ordered ingredient list for one session.
///
/// # Invariants
///
/// - Ids are unique: every id comes from a counter that never rewinds, even
///   when re-analysis replaces the whole list.
/// - Names are trimmed and never empty.
#[derive(Debug, Clone, Default)]
pub struct IngredientEditor {
    items: Vec<Ingredient>,
    next_seq: u64,
}

impl IngredientEditor {
    /// Empty editor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingredients in display order.
    pub fn items(&self) -> &[Ingredient] {
        &self.items
    }

    /// Look up an ingredient by id.
    pub fn get(&self, id: &IngredientId) -> Option<&Ingredient> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Number of ingredients.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when there are no ingredients.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a user ingredient.
    ///
    /// Numeric text is coerced leniently; blanks and garbage become zero.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyName` when the trimmed name is empty.
    /// The list is unchanged in that case.
    pub fn add(&mut self, draft: IngredientDraft) -> Result<&Ingredient, ValidationError> {
        let name = validated_name(&draft.name)?;
        let ingredient = Ingredient {
            id: self.next_id(USER_PREFIX),
            name,
            calories: Amount::parse_lenient(&draft.calories),
            protein_g: Amount::parse_lenient(&draft.protein),
            carbs_g: Amount::parse_lenient(&draft.carbs),
            fat_g: Amount::parse_lenient(&draft.fat),
            fiber_g: draft.fiber.as_deref().map(Amount::parse_lenient),
            sugar_g: draft.sugar.as_deref().map(Amount::parse_lenient),
            sodium_mg: draft.sodium.as_deref().map(Amount::parse_lenient),
            provenance: Provenance::User,
        };
        let index = self.items.len();
        self.items.push(ingredient);
        Ok(&self.items[index])
    }

    /// Remove the ingredient with `id`.
    ///
    /// Removing an absent id is a no-op and returns `None`.
    pub fn remove(&mut self, id: &IngredientId) -> Option<Ingredient> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        Some(self.items.remove(index))
    }

    /// Apply `patch` to the ingredient with `id`, keeping its id and provenance.
    ///
    /// # Errors
    ///
    /// `UnknownIngredient` for an absent id, `Validation` when the patch
    /// blanks the name. The ingredient is unchanged on error.
    pub fn update(
        &mut self,
        id: &IngredientId,
        patch: IngredientPatch,
    ) -> Result<&Ingredient, WorkflowError> {
        let index = self
            .items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| WorkflowError::UnknownIngredient(id.clone()))?;

        let name = patch.name.as_deref().map(validated_name).transpose()?;

        let item = &mut self.items[index];
        if let Some(name) = name {
            item.name = name;
        }
        if let Some(raw) = &patch.calories {
            item.calories = Amount::parse_lenient(raw);
        }
        if let Some(raw) = &patch.protein {
            item.protein_g = Amount::parse_lenient(raw);
        }
        if let Some(raw) = &patch.carbs {
            item.carbs_g = Amount::parse_lenient(raw);
        }
        if let Some(raw) = &patch.fat {
            item.fat_g = Amount::parse_lenient(raw);
        }
        if let Some(raw) = &patch.fiber {
            item.fiber_g = Some(Amount::parse_lenient(raw));
        }
        if let Some(raw) = &patch.sugar {
            item.sugar_g = Some(Amount::parse_lenient(raw));
        }
        if let Some(raw) = &patch.sodium {
            item.sodium_mg = Some(Amount::parse_lenient(raw));
        }
        Ok(&self.items[index])
    }

    /// Drop every ingredient and seed the list from `result`.
    ///
    /// User-added ingredients are not carried over.
    pub fn replace_from_analysis(&mut self, result: &AnalysisResult) {
        self.items.clear();
        for (index, item) in result.items.iter().enumerate() {
            let name = match item.name.trim() {
                "" => format!("Item {}", index + 1),
                trimmed => trimmed.to_string(),
            };
            let ingredient = Ingredient {
                id: self.next_id(AI_PREFIX),
                name,
                calories: item.calories,
                protein_g: item.protein_g,
                carbs_g: item.carbs_g,
                fat_g: item.fat_g,
                fiber_g: item.fiber_g,
                sugar_g: item.sugar_g,
                sodium_mg: item.sodium_mg,
                provenance: Provenance::Ai,
            };
            self.items.push(ingredient);
        }
    }

    fn next_id(&mut self, prefix: &str) -> IngredientId {
        let id = IngredientId::generated(prefix, self.next_seq);
        self.next_seq += 1;
        id
    }
}

fn validated_name(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}
