// ABOUTME: Meal candidate model with backend-computed macros and diagnostics
// ABOUTME: Tracks macro provenance, per-ingredient contributions, and resolution gaps
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::constraints::DayPart;
use super::ingredient::IngredientEntry;
use serde::{Deserialize, Serialize};

/// Where a meal's macros came from
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MacroSource {
    /// Not yet aggregated, or no ingredient could be resolved
    #[default]
    Unverified,
    /// Every contributing fact was fetched from the provider during aggregation
    LiveLookup,
    /// At least one contributing fact came from a cache seeded earlier in the request
    CachedLookup,
}

/// Calories and macronutrients, in kcal and grams
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MacroTotals {
    /// Energy in kcal
    pub calories: i64,
    /// Protein in grams
    pub protein: i64,
    /// Carbohydrates in grams
    pub carbs: i64,
    /// Fat in grams
    pub fats: i64,
}

/// One ingredient's share of a meal's calories
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngredientContribution {
    /// Normalized term that was resolved
    pub ingredient: String,
    /// Weight used for scaling, rounded to 0.1 g
    pub grams: f64,
    /// Calories contributed, rounded to 0.1 kcal
    pub calories: f64,
    /// Source identifier of the fact used
    pub source_id: String,
}

/// A meal produced by decoding and refined by the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MealCandidate {
    /// Identifier assigned on acceptance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Day-part tag exactly as the generator wrote it
    pub meal_type: String,
    /// Meal name
    pub name: String,
    /// Normalized ingredients in generation order
    pub ingredients: Vec<IngredientEntry>,
    /// Cooking steps
    pub instructions: Vec<String>,
    /// Authoritative energy in kcal
    pub calories: i64,
    /// Authoritative protein in grams
    pub protein: i64,
    /// Authoritative carbohydrates in grams
    pub carbs: i64,
    /// Authoritative fat in grams
    pub fats: i64,
    /// Provenance of the macro fields
    pub macro_source: MacroSource,
    /// Generator-proposed macros, kept for diagnostics only
    pub model_macros: MacroTotals,
    /// Per-ingredient calorie contributions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributions: Vec<IngredientContribution>,
    /// Ingredients that contributed nothing (no weight or no fact)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<String>,
    /// Annotation attached when the meal was used to fill a slot despite a rule violation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calorie_warning: Option<String>,
}

impl MealCandidate {
    /// Normalized day-part, if the tag names one
    #[must_use]
    pub fn day_part(&self) -> Option<DayPart> {
        DayPart::from_tag(&self.meal_type)
    }

    /// Current macro fields as a totals value
    #[must_use]
    pub const fn macros(&self) -> MacroTotals {
        MacroTotals {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fats: self.fats,
        }
    }

    /// Overwrite the macro fields
    pub fn set_macros(&mut self, totals: MacroTotals) {
        self.calories = totals.calories;
        self.protein = totals.protein;
        self.carbs = totals.carbs;
        self.fats = totals.fats;
    }
}
