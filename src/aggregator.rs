// ABOUTME: Recomputes meal macros from resolved ingredient facts scaled by weight
// ABOUTME: Records per-ingredient contributions, gaps, and the provenance of the totals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Macro Aggregation
//!
//! Backend totals replace whatever the generator claimed. Each weighed,
//! resolvable ingredient contributes its fact's reference-serving macros
//! scaled by `weight_g / serving_size_g`. Ingredients without a weight or a
//! fact are listed as gaps; condiments are skipped silently.

use crate::ingredients::{is_condiment, normalize_term};
use crate::nutrition::{FactOrigin, NutritionResolver};
use mealforge_core::models::{IngredientContribution, MacroSource, MacroTotals, MealCandidate};
use tracing::debug;

/// Unrounded running totals
#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    calories: f64,
    protein: f64,
    carbs: f64,
    fats: f64,
}

impl Totals {
    fn rounded(self) -> MacroTotals {
        MacroTotals {
            calories: self.calories.round() as i64,
            protein: self.protein.round() as i64,
            carbs: self.carbs.round() as i64,
            fats: self.fats.round() as i64,
        }
    }
}

/// Round to 1 decimal place
fn round_to_1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Overwrite a meal's macros with totals computed from resolved facts
///
/// When no ingredient resolves, the meal keeps its generator figures and is
/// tagged [`MacroSource::Unverified`].
pub async fn aggregate(meal: &mut MealCandidate, resolver: &mut NutritionResolver) {
    let mut totals = Totals::default();
    let mut contributions = Vec::new();
    let mut gaps = Vec::new();
    let mut any_cached = false;

    for entry in &mut meal.ingredients {
        let term = normalize_term(&entry.name);
        if term.is_empty() || is_condiment(&term) {
            continue;
        }
        let Some(grams) = entry.weight_g.filter(|_| entry.has_weight()) else {
            gaps.push(entry.name.clone());
            continue;
        };
        let Some(resolution) = resolver.resolve_with_origin(&term).await else {
            gaps.push(entry.name.clone());
            continue;
        };

        let fact = &resolution.fact;
        let scale = fact.scale_for(grams);
        let calories = fact.calories * scale;
        totals.calories += calories;
        totals.protein += fact.protein_g * scale;
        totals.carbs += fact.carbs_g * scale;
        totals.fats += fact.fats_g * scale;
        any_cached |= resolution.origin == FactOrigin::Cached;

        let rounded = round_to_1(calories);
        debug!(
            ingredient.term = %term,
            ingredient.grams = round_to_1(grams),
            fact.serving_g = fact.serving_size_g,
            calories = rounded,
            "Ingredient contribution"
        );
        entry.calories = Some(rounded);
        contributions.push(IngredientContribution {
            ingredient: term,
            grams: round_to_1(grams),
            calories: rounded,
            source_id: fact.source_id.clone(),
        });
    }

    meal.gaps = gaps;
    if contributions.is_empty() {
        meal.contributions = Vec::new();
        meal.macro_source = MacroSource::Unverified;
        return;
    }

    meal.set_macros(totals.rounded());
    meal.contributions = contributions;
    meal.macro_source = if any_cached {
        MacroSource::CachedLookup
    } else {
        MacroSource::LiveLookup
    };
}

/// Aggregate every meal in order with one resolver
pub async fn aggregate_all(meals: &mut [MealCandidate], resolver: &mut NutritionResolver) {
    for meal in meals.iter_mut() {
        aggregate(meal, resolver).await;
    }
}
