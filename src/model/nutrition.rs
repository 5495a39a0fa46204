//! Ingredient records and nutrient totals.

use crate::model::{Amount, IngredientId};
use serde::{Deserialize, Serialize};
use std::ops::Add;

// ===== NutritionTotals =====

/// Elementwise nutrient sums for a set of ingredients.
///
/// Optional ingredient fields are always present here; a missing field
/// contributes zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionTotals {
    /// Energy in kcal.
    pub calories: Amount,
    /// Protein in grams.
    pub protein_g: Amount,
    /// Carbohydrates in grams.
    pub carbs_g: Amount,
    /// Fat in grams.
    pub fat_g: Amount,
    /// Dietary fiber in grams.
    pub fiber_g: Amount,
    /// Sugars in grams.
    pub sugar_g: Amount,
    /// Sodium in milligrams.
    pub sodium_mg: Amount,
}

impl Add for NutritionTotals {
    type Output = NutritionTotals;

    fn add(self, rhs: NutritionTotals) -> NutritionTotals {
        NutritionTotals {
            calories: self.calories + rhs.calories,
            protein_g: self.protein_g + rhs.protein_g,
            carbs_g: self.carbs_g + rhs.carbs_g,
            fat_g: self.fat_g + rhs.fat_g,
            fiber_g: self.fiber_g + rhs.fiber_g,
            sugar_g: self.sugar_g + rhs.sugar_g,
            sodium_mg: self.sodium_mg + rhs.sodium_mg,
        }
    }
}

// ===== Provenance =====

/// Who produced an ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Seeded from an analysis result.
    Ai,
    /// Added by the user.
    User,
}

// ===== Ingredient =====

/// One line item of a meal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Session-unique id.
    pub id: IngredientId,
    /// Display name, never empty.
    pub name: String,
    /// Energy in kcal.
    pub calories: Amount,
    /// Protein in grams.
    pub protein_g: Amount,
    /// Carbohydrates in grams.
    pub carbs_g: Amount,
    /// Fat in grams.
    pub fat_g: Amount,
    /// Dietary fiber in grams, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber_g: Option<Amount>,
    /// Sugars in grams, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar_g: Option<Amount>,
    /// Sodium in milligrams, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sodium_mg: Option<Amount>,
    /// Origin of this record.
    pub provenance: Provenance,
}

impl Ingredient {
    /// This ingredient's contribution to session totals.
    pub fn contribution(&self) -> NutritionTotals {
        NutritionTotals {
            calories: self.calories,
            protein_g: self.protein_g,
            carbs_g: self.carbs_g,
            fat_g: self.fat_g,
            fiber_g: self.fiber_g.unwrap_or_default(),
            sugar_g: self.sugar_g.unwrap_or_default(),
            sodium_mg: self.sodium_mg.unwrap_or_default(),
        }
    }

    /// True when the user added this ingredient.
    pub fn is_user_added(&self) -> bool {
        self.provenance == Provenance::User
    }
}

// ===== IngredientDraft =====

/// Raw user input for a new ingredient.
///
/// Numeric fields hold text exactly as typed; they are coerced leniently
/// when the draft is accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientDraft {
    /// Name as typed.
    pub name: String,
    /// Calories as typed.
    pub calories: String,
    /// Protein as typed.
    pub protein: String,
    /// Carbohydrates as typed.
    pub carbs: String,
    /// Fat as typed.
    pub fat: String,
    /// Fiber as typed, if the user supplied it.
    pub fiber: Option<String>,
    /// Sugar as typed, if the user supplied it.
    pub sugar: Option<String>,
    /// Sodium as typed, if the user supplied it.
    pub sodium: Option<String>,
}

impl IngredientDraft {
    /// Start a draft with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the four macro fields at once.
    pub fn macros(
        mut self,
        calories: impl Into<String>,
        protein: impl Into<String>,
        carbs: impl Into<String>,
        fat: impl Into<String>,
    ) -> Self {
        self.calories = calories.into();
        self.protein = protein.into();
        self.carbs = carbs.into();
        self.fat = fat.into();
        self
    }
}

// ===== IngredientPatch =====

/// Partial update for an existing ingredient. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientPatch {
    /// New name.
    pub name: Option<String>,
    /// New calories text.
    pub calories: Option<String>,
    /// New protein text.
    pub protein: Option<String>,
    /// New carbohydrates text.
    pub carbs: Option<String>,
    /// New fat text.
    pub fat: Option<String>,
    /// New fiber text.
    pub fiber: Option<String>,
    /// New sugar text.
    pub sugar: Option<String>,
    /// New sodium text.
    pub sodium: Option<String>,
}

impl IngredientPatch {
    /// True when the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set one field by its user-facing name.
    ///
    /// Returns `false` for an unknown field name.
    pub fn set_field(&mut self, field: &str, value: impl Into<String>) -> bool {
        let slot = match field {
            "name" => &mut self.name,
            "calories" | "cal" => &mut self.calories,
            "protein" | "p" => &mut self.protein,
            "carbs" | "c" => &mut self.carbs,
            "fat" | "f" => &mut self.fat,
            "fiber" => &mut self.fiber,
            "sugar" => &mut self.sugar,
            "sodium" => &mut self.sodium,
            _ => return false,
        };
        *slot = Some(value.into());
        true
    }
}
