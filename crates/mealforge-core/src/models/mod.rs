// ABOUTME: Core data models for the meal plan pipeline
// ABOUTME: Re-exports meal, ingredient, nutrition fact, and constraint types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Values that flow through one generation attempt. Nothing here has an
//! identity beyond that attempt except `MealCandidate::id`, assigned when a
//! meal is accepted.
//!
//! ## Core Models
//!
//! - `MealCandidate`: a decoded meal with normalized ingredients and backend macros
//! - `IngredientEntry`: quantity, unit, and weight parsed from one ingredient
//! - `NutritionFact`: per-serving macros for one resolved ingredient
//! - `RetrievalBatch`: facts grouped by query terms, with warnings for misses
//! - `ConstraintSet` / `CalorieRule`: sanitized user constraints

mod constraints;
mod ingredient;
mod meal;
mod nutrition;

pub use constraints::{
    CalorieOperator, CalorieRule, CalorieScope, ConstraintSet, DayPart, DietaryRestriction,
};
pub use ingredient::{grams_to_ounces, ounces_to_grams, IngredientEntry};
pub use meal::{IngredientContribution, MacroSource, MacroTotals, MealCandidate};
pub use nutrition::{FoodNutrient, FoodRecord, NutritionFact, RetrievalBatch};
