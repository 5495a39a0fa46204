//! Nutrient aggregation.

use crate::model::{Ingredient, NutritionTotals};

/// Sum every nutrient field across `ingredients`.
///
/// Missing optional fields contribute zero. The result does not depend on
/// ingredient order.
pub fn recompute(ingredients: &[Ingredient]) -> NutritionTotals {
    ingredients
        .iter()
        .map(Ingredient::contribution)
        .fold(NutritionTotals::default(), |acc, next| acc + next)
}
