//! Submission payload.

use crate::model::{Amount, CapturedImage, Ingredient, Language, NutritionTotals, Provenance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Meal name used when the analysis did not propose one.
pub const DEFAULT_MEAL_NAME: &str = "Edited Meal";

/// One ingredient as persisted with the meal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealItem {
    /// Ingredient name.
    pub name: String,
    /// Energy in kcal.
    pub calories: Amount,
    /// Protein in grams.
    pub protein_g: Amount,
    /// Carbohydrates in grams.
    pub carbs_g: Amount,
    /// Fat in grams.
    pub fat_g: Amount,
    /// Fiber in grams; zero when unknown.
    pub fiber_g: Amount,
    /// Sugars in grams; zero when unknown.
    pub sugar_g: Amount,
    /// Sodium in milligrams; zero when unknown.
    pub sodium_mg: Amount,
    /// Origin of the ingredient.
    pub provenance: Provenance,
}

impl From<&Ingredient> for MealItem {
    fn from(ingredient: &Ingredient) -> Self {
        let facts = ingredient.contribution();
        Self {
            name: ingredient.name.clone(),
            calories: facts.calories,
            protein_g: facts.protein_g,
            carbs_g: facts.carbs_g,
            fat_g: facts.fat_g,
            fiber_g: facts.fiber_g,
            sugar_g: facts.sugar_g,
            sodium_mg: facts.sodium_mg,
            provenance: ingredient.provenance,
        }
    }
}

/// The edited meal as approved by the user.
///
/// `totals` is always the sum over `items`; it is never copied from the
/// analysis result. The analysis totals ride along separately for auditing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    /// Meal name.
    pub meal_name: String,
    /// Description: the user's comment, or the service description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Language the meal was analysed in.
    pub language: Language,
    /// Edited totals.
    pub totals: NutritionTotals,
    /// Edited ingredient list.
    pub items: Vec<MealItem>,
    /// Totals the service originally reported, if any analysis ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_analysis_totals: Option<NutritionTotals>,
    /// When the record was built.
    pub created_at: DateTime<Utc>,
    /// Source image; stores decide whether to upload it.
    #[serde(skip)]
    pub image: Option<CapturedImage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IngredientId;

    #[test]
    fn meal_item_zero_fills_missing_optionals() {
        let ingredient = Ingredient {
            id: IngredientId::generated("user", 1),
            name: "Apple".to_string(),
            calories: Amount::whole(95),
            protein_g: Amount::ZERO,
            carbs_g: Amount::whole(25),
            fat_g: Amount::ZERO,
            fiber_g: Some(Amount::whole(4)),
            sugar_g: None,
            sodium_mg: None,
            provenance: Provenance::User,
        };
        let item = MealItem::from(&ingredient);
        assert_eq!(item.fiber_g, Amount::whole(4));
        assert_eq!(item.sugar_g, Amount::ZERO);
        assert_eq!(item.provenance, Provenance::User);
    }

    #[test]
    fn meal_record_serialization_skips_image() {
        let record = MealRecord {
            meal_name: DEFAULT_MEAL_NAME.to_string(),
            description: None,
            language: Language::English,
            totals: NutritionTotals::default(),
            items: Vec::new(),
            source_analysis_totals: None,
            created_at: Utc::now(),
            image: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["meal_name"], "Edited Meal");
        assert_eq!(json["language"], "en");
        assert!(json.get("image").is_none());
        assert!(json.get("description").is_none());
    }

    #[test]
    fn source_analysis_totals_keep_their_field_name() {
        let record = MealRecord {
            meal_name: "Lunch".to_string(),
            description: None,
            language: Language::Hebrew,
            totals: NutritionTotals::default(),
            items: Vec::new(),
            source_analysis_totals: Some(NutritionTotals {
                calories: Amount::whole(640),
                ..NutritionTotals::default()
            }),
            created_at: Utc::now(),
            image: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["source_analysis_totals"]["calories"], 640.0);
        assert!(json.get("analysis_totals").is_none());

        let back: MealRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back.source_analysis_totals, record.source_analysis_totals);
    }
}
