//! JSON wire format of the nutrition API.
//!
//! Responses are decoded through [`serde_json::Value`] rather than typed
//! structs: the service sends numbers as either JSON numbers or numeric
//! strings and omits fields freely.

use crate::model::{
    Amount, AnalysisResult, AnalyzedItem, CapturedImage, Language, MealRecord, NutritionTotals,
    PersistedId,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;

/// Body of `POST /nutrition/analyze`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequestBody<'a> {
    /// Image bytes, standard base64.
    pub image_base64: String,
    /// Free-text hint for the estimator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_text: Option<&'a str>,
    /// Locale code.
    pub language: Language,
}

impl<'a> AnalyzeRequestBody<'a> {
    /// Build the body for one analysis call.
    pub fn new(image: &CapturedImage, hint: Option<&'a str>, language: Language) -> Self {
        Self {
            image_base64: encode_image(image),
            update_text: hint,
            language,
        }
    }
}

/// Body of `POST /nutrition/meals`.
#[derive(Debug, Serialize)]
pub struct MealRequestBody<'a> {
    /// The edited meal.
    #[serde(flatten)]
    pub meal: &'a MealRecord,
    /// Source image, standard base64.
    #[serde(rename = "imageBase64", skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

impl<'a> MealRequestBody<'a> {
    /// Build the body for one submission.
    pub fn new(meal: &'a MealRecord) -> Self {
        Self {
            meal,
            image_base64: meal.image.as_ref().map(encode_image),
        }
    }
}

/// Encode image bytes as standard base64.
pub fn encode_image(image: &CapturedImage) -> String {
    STANDARD.encode(image.bytes())
}

/// Decode an analysis response body.
///
/// # Errors
///
/// Returns a message when the body is not JSON, reports `success: false`,
/// or carries no `data` object.
pub fn decode_analysis(body: &str) -> Result<AnalysisResult, String> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| format!("unreadable response: {e}"))?;
    let data = envelope_data(&value)?;

    let items = data
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(decode_item).collect())
        .unwrap_or_default();

    Ok(AnalysisResult {
        meal_name: text(data, "meal_name"),
        description: text(data, "description"),
        items,
        totals: NutritionTotals {
            calories: amount(data, "calories"),
            protein_g: amount(data, "protein_g"),
            carbs_g: amount(data, "carbs_g"),
            fat_g: amount(data, "fats_g"),
            fiber_g: amount(data, "fiber_g"),
            sugar_g: amount(data, "sugar_g"),
            sodium_mg: amount(data, "sodium_mg"),
        },
    })
}

/// Decode the persisted meal id from a store response body.
///
/// `meal_id` may be a string or a number.
///
/// # Errors
///
/// Returns a message when the body is not JSON, reports `success: false`,
/// or carries no usable id.
pub fn decode_meal_id(body: &str) -> Result<PersistedId, String> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| format!("unreadable response: {e}"))?;
    let data = envelope_data(&value)?;

    let raw = match data.get("meal_id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err("response has no meal_id".to_string()),
    };
    PersistedId::new(raw).map_err(|e| e.to_string())
}

/// Best-effort error message from a failure body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| reported_error(&v))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "empty response".to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        })
}

fn envelope_data(value: &Value) -> Result<&Value, String> {
    if value.get("success") == Some(&Value::Bool(false)) {
        return Err(reported_error(value).unwrap_or_else(|| "request failed".to_string()));
    }
    match value.get("data") {
        Some(data @ Value::Object(_)) => Ok(data),
        _ => Err("response has no data".to_string()),
    }
}

fn reported_error(value: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn decode_item(item: &Value) -> AnalyzedItem {
    AnalyzedItem {
        name: item
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        calories: amount(item, "calories"),
        protein_g: amount(item, "protein"),
        carbs_g: amount(item, "carbs"),
        fat_g: amount(item, "fat"),
        fiber_g: optional_amount(item, "fiber"),
        sugar_g: optional_amount(item, "sugar"),
        sodium_mg: optional_amount(item, "sodium_mg"),
    }
}

fn amount(object: &Value, key: &str) -> Amount {
    object.get(key).map(Amount::from_json).unwrap_or_default()
}

fn optional_amount(object: &Value, key: &str) -> Option<Amount> {
    object
        .get(key)
        .filter(|v| !v.is_null())
        .map(Amount::from_json)
}

fn text(object: &Value, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
