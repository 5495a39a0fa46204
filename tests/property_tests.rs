//! Property-based tests for aggregation and editing invariants.
//!
//! Tests validate:
//! 1. Totals are the fieldwise sum of ingredient contributions
//! 2. Totals do not depend on ingredient order
//! 3. Adding then removing an ingredient restores totals exactly
//! 4. Ingredient ids stay unique across edits
//! 5. Lenient parsing never yields a negative amount

use mealsnap::model::{
    Amount, AnalysisResult, AnalyzedItem, CapturedImage, ImageOrigin, Ingredient, IngredientDraft,
    IngredientId, Language, NutritionTotals, Provenance,
};
use mealsnap::state::{recompute, WorkflowCoordinator};
use proptest::prelude::*;
use std::collections::HashSet;

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

fn millis() -> impl Strategy<Value = i64> {
    0i64..2_000_000
}

/// calories, protein, carbs, fat, fiber, sugar, sodium
type Spec = (i64, i64, i64, i64, Option<i64>, Option<i64>, Option<i64>);

fn ingredient_strategy() -> impl Strategy<Value = Spec> {
    (
        millis(),
        millis(),
        millis(),
        millis(),
        proptest::option::of(millis()),
        proptest::option::of(millis()),
        proptest::option::of(millis()),
    )
}

fn build(index: usize, (cal, p, c, f, fiber, sugar, sodium): Spec) -> Ingredient {
    Ingredient {
        id: IngredientId::new(format!("p-{index}")).unwrap(),
        name: format!("Item {index}"),
        calories: Amount::from_millis(cal),
        protein_g: Amount::from_millis(p),
        carbs_g: Amount::from_millis(c),
        fat_g: Amount::from_millis(f),
        fiber_g: fiber.map(Amount::from_millis),
        sugar_g: sugar.map(Amount::from_millis),
        sodium_mg: sodium.map(Amount::from_millis),
        provenance: Provenance::Ai,
    }
}

fn editing_coordinator(items: &[Spec]) -> WorkflowCoordinator {
    let mut coordinator = WorkflowCoordinator::new(Language::English);
    let image = CapturedImage::from_bytes(JPEG, ImageOrigin::Gallery).unwrap();
    coordinator.attach_image(image).unwrap();
    let request = coordinator.begin_analyze().unwrap();
    let result = AnalysisResult {
        meal_name: None,
        description: None,
        items: items
            .iter()
            .enumerate()
            .map(|(i, &(cal, p, c, f, ..))| {
                AnalyzedItem::macros(
                    format!("Item {i}"),
                    Amount::from_millis(cal),
                    Amount::from_millis(p),
                    Amount::from_millis(c),
                    Amount::from_millis(f),
                )
            })
            .collect(),
        totals: NutritionTotals::default(),
    };
    coordinator
        .complete_analysis(request.ticket, Ok(result))
        .unwrap();
    coordinator
}

fn decimal(millis: i64) -> String {
    format!("{}.{:03}", millis / 1000, millis % 1000)
}

// ===== Property 1: Fieldwise Sum =====

proptest! {
    #[test]
    fn totals_are_fieldwise_sums(specs in prop::collection::vec(ingredient_strategy(), 0..20)) {
        let ingredients: Vec<Ingredient> =
            specs.iter().enumerate().map(|(i, s)| build(i, *s)).collect();
        let totals = recompute(&ingredients);

        let calories: i64 = specs.iter().map(|s| s.0).sum();
        let protein: i64 = specs.iter().map(|s| s.1).sum();
        let carbs: i64 = specs.iter().map(|s| s.2).sum();
        let fat: i64 = specs.iter().map(|s| s.3).sum();
        let fiber: i64 = specs.iter().filter_map(|s| s.4).sum();
        let sugar: i64 = specs.iter().filter_map(|s| s.5).sum();
        let sodium: i64 = specs.iter().filter_map(|s| s.6).sum();
        prop_assert_eq!(totals.calories.millis(), calories);
        prop_assert_eq!(totals.protein_g.millis(), protein);
        prop_assert_eq!(totals.carbs_g.millis(), carbs);
        prop_assert_eq!(totals.fat_g.millis(), fat);
        prop_assert_eq!(totals.fiber_g.millis(), fiber);
        prop_assert_eq!(totals.sugar_g.millis(), sugar);
        prop_assert_eq!(totals.sodium_mg.millis(), sodium);
    }
}

// ===== Property 2: Order Independence =====

proptest! {
    #[test]
    fn totals_ignore_order(
        specs in prop::collection::vec(ingredient_strategy(), 1..20),
        rotation in 0usize..20,
    ) {
        let ingredients: Vec<Ingredient> =
            specs.iter().enumerate().map(|(i, s)| build(i, *s)).collect();

        let mut rotated = ingredients.clone();
        rotated.rotate_left(rotation % ingredients.len());
        let mut reversed = ingredients.clone();
        reversed.reverse();

        let totals = recompute(&ingredients);
        prop_assert_eq!(recompute(&rotated), totals);
        prop_assert_eq!(recompute(&reversed), totals);
    }
}

// ===== Property 3: Add/Remove Round Trip =====

proptest! {
    #[test]
    fn add_then_remove_restores_totals(
        seeded in prop::collection::vec(ingredient_strategy(), 0..8),
        added in ingredient_strategy(),
    ) {
        let mut coordinator = editing_coordinator(&seeded);
        let before = coordinator.session().unwrap().totals();

        let draft = IngredientDraft::named("Extra").macros(
            decimal(added.0),
            decimal(added.1),
            decimal(added.2),
            decimal(added.3),
        );
        let id = coordinator.add_ingredient(draft).unwrap();
        let during = coordinator.session().unwrap().totals();
        prop_assert_eq!(during.calories.millis(), before.calories.millis() + added.0);

        coordinator.remove_ingredient(&id).unwrap();
        prop_assert_eq!(coordinator.session().unwrap().totals(), before);
    }
}

// ===== Property 4: Unique Ids =====

proptest! {
    #[test]
    fn ids_stay_unique_across_edits(
        seeded in prop::collection::vec(ingredient_strategy(), 0..6),
        ops in prop::collection::vec(any::<bool>(), 0..30),
    ) {
        let mut coordinator = editing_coordinator(&seeded);
        let mut seen = HashSet::new();
        for ingredient in coordinator.session().unwrap().ingredients() {
            seen.insert(ingredient.id.clone());
        }

        for add in ops {
            if add {
                let id = coordinator
                    .add_ingredient(IngredientDraft::named("Snack"))
                    .unwrap();
                prop_assert!(seen.insert(id), "id reused");
            } else if let Some(first) = coordinator
                .session()
                .unwrap()
                .ingredients()
                .first()
                .map(|i| i.id.clone())
            {
                coordinator.remove_ingredient(&first).unwrap();
            }

            let ids: HashSet<_> = coordinator
                .session()
                .unwrap()
                .ingredients()
                .iter()
                .map(|i| i.id.clone())
                .collect();
            prop_assert_eq!(ids.len(), coordinator.session().unwrap().ingredients().len());
        }
    }
}

// ===== Property 5: Lenient Parsing =====

proptest! {
    #[test]
    fn lenient_parse_is_never_negative(s in any::<String>()) {
        prop_assert!(Amount::parse_lenient(&s).millis() >= 0);
    }

    #[test]
    fn lenient_parse_reads_plain_decimals(value in 0i64..10_000_000) {
        prop_assert_eq!(Amount::parse_lenient(&decimal(value)).millis(), value);
    }
}
