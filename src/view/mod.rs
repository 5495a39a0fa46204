//! Plain-text rendering of the workflow state.
//!
//! Everything here is a pure function of the coordinator; the shell prints
//! the returned strings.

pub mod format;
pub mod help;

pub use help::render_help;

use crate::model::{Ingredient, NutritionTotals};
use crate::state::{Session, WorkflowCoordinator};
use format::{calories, grams, milligrams};

/// Status line plus the last surfaced error, if any.
pub fn render_status(coordinator: &WorkflowCoordinator) -> String {
    let mut out = format!("Status: {}", coordinator.status());
    if let Some(id) = coordinator.committed_id() {
        out.push_str(&format!(" (saved as {id})"));
    }
    out.push('\n');
    if let Some(error) = coordinator.last_error() {
        out.push_str(&format!("Error: {error}\n"));
    }
    out
}

/// Status, ingredient table and totals.
pub fn render(coordinator: &WorkflowCoordinator) -> String {
    let mut out = render_status(coordinator);
    if let Some(session) = coordinator.session() {
        out.push_str(&render_session(session));
    }
    out
}

/// Meal heading, ingredient table and totals for one session.
pub fn render_session(session: &Session) -> String {
    let mut out = String::new();

    if let Some(analysis) = session.latest_analysis() {
        if let Some(name) = analysis.meal_name.as_deref().filter(|n| !n.trim().is_empty()) {
            out.push_str(&format!("Meal: {}\n", name.trim()));
        }
    } else {
        out.push_str("Not analysed yet.\n");
    }

    if !session.pre_comment().is_empty() {
        out.push_str(&format!("Hint: {}\n", session.pre_comment()));
    }
    if !session.post_comment().is_empty() {
        out.push_str(&format!("Note: {}\n", session.post_comment()));
    }

    let ingredients = session.ingredients();
    if ingredients.is_empty() {
        out.push_str("No ingredients.\n");
    } else {
        let id_width = ingredients
            .iter()
            .map(|i| i.id.as_str().chars().count())
            .max()
            .unwrap_or(0);
        for ingredient in ingredients {
            out.push_str(&render_ingredient(ingredient, id_width));
            out.push('\n');
        }
    }

    out.push_str(&render_totals(&session.totals()));
    out
}

/// One table row. User-added rows are marked with `*`.
pub fn render_ingredient(ingredient: &Ingredient, id_width: usize) -> String {
    let marker = if ingredient.is_user_added() { '*' } else { ' ' };
    let mut row = format!(
        "{marker} {:<id_width$}  {}  {} kcal  P {}g  C {}g  F {}g",
        ingredient.id.as_str(),
        ingredient.name,
        calories(ingredient.calories),
        grams(ingredient.protein_g),
        grams(ingredient.carbs_g),
        grams(ingredient.fat_g),
    );
    if let Some(fiber) = ingredient.fiber_g {
        row.push_str(&format!("  fiber {}g", grams(fiber)));
    }
    if let Some(sugar) = ingredient.sugar_g {
        row.push_str(&format!("  sugar {}g", grams(sugar)));
    }
    if let Some(sodium) = ingredient.sodium_mg {
        row.push_str(&format!("  sodium {}mg", milligrams(sodium)));
    }
    row
}

/// Totals line. Micronutrients are shown only when non-zero.
pub fn render_totals(totals: &NutritionTotals) -> String {
    let mut out = format!(
        "Total: {} kcal  P {}g  C {}g  F {}g",
        calories(totals.calories),
        grams(totals.protein_g),
        grams(totals.carbs_g),
        grams(totals.fat_g),
    );
    if !totals.fiber_g.is_zero() {
        out.push_str(&format!("  fiber {}g", grams(totals.fiber_g)));
    }
    if !totals.sugar_g.is_zero() {
        out.push_str(&format!("  sugar {}g", grams(totals.sugar_g)));
    }
    if !totals.sodium_mg.is_zero() {
        out.push_str(&format!("  sodium {}mg", milligrams(totals.sodium_mg)));
    }
    out.push('\n');
    out
}
