//! Analysis results returned by the estimation service.

use crate::model::{Amount, NutritionTotals};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ===== Language =====

/// Locale sent to the analysis service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    /// English (`en`).
    #[default]
    #[serde(rename = "en")]
    English,
    /// Hebrew (`he`).
    #[serde(rename = "he")]
    Hebrew,
}

impl Language {
    /// Wire code for this language.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hebrew => "he",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Language::English),
            "he" => Ok(Language::Hebrew),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

/// A language code other than `en` or `he`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown language code '{0}' (expected 'en' or 'he')")]
pub struct UnknownLanguage(pub String);

// ===== AnalysisResult =====

/// One item as reported by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzedItem {
    /// Item name; may be empty when the service did not name it.
    pub name: String,
    /// Energy in kcal.
    pub calories: Amount,
    /// Protein in grams.
    pub protein_g: Amount,
    /// Carbohydrates in grams.
    pub carbs_g: Amount,
    /// Fat in grams.
    pub fat_g: Amount,
    /// Fiber in grams, when reported.
    pub fiber_g: Option<Amount>,
    /// Sugars in grams, when reported.
    pub sugar_g: Option<Amount>,
    /// Sodium in milligrams, when reported.
    pub sodium_mg: Option<Amount>,
}

impl AnalyzedItem {
    /// Item with only the four macro fields set.
    pub fn macros(
        name: impl Into<String>,
        calories: Amount,
        protein_g: Amount,
        carbs_g: Amount,
        fat_g: Amount,
    ) -> Self {
        Self {
            name: name.into(),
            calories,
            protein_g,
            carbs_g,
            fat_g,
            fiber_g: None,
            sugar_g: None,
            sodium_mg: None,
        }
    }
}

/// Output of one analysis call. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Meal name proposed by the service.
    pub meal_name: Option<String>,
    /// Free-text description proposed by the service.
    pub description: Option<String>,
    /// Per-item breakdown.
    pub items: Vec<AnalyzedItem>,
    /// Totals as computed by the service. Informational only: session totals
    /// are always recomputed from ingredients.
    pub totals: NutritionTotals,
}
