// ABOUTME: Converts a decoded meal object into a typed meal candidate
// ABOUTME: Normalizes ingredients and instructions and keeps generator macros as hints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::instructions::normalize_instructions;
use super::normalizer::normalize_all;
use mealforge_core::models::{MacroTotals, MealCandidate};
use serde_json::{Map, Value};

const MEAL_TYPE_KEYS: &[&str] = &["mealType", "meal_type", "type"];
const NAME_KEYS: &[&str] = &["name", "title"];

fn first_text(object: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .unwrap_or_default()
        .to_owned()
}

/// Read a macro field: numbers, numeric strings ("450 kcal"), or 0
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn coerce_macro(value: Option<&Value>) -> i64 {
    let number = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => {
            let digits: String = text
                .chars()
                .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
                .collect();
            digits.parse::<f64>().ok()
        }
        _ => None,
    };
    number
        .filter(|value| value.is_finite())
        .map_or(0, |value| value.trunc() as i64)
}

/// Build a meal candidate from one decoded meal object
///
/// The generator's macro figures are kept in `model_macros` and copied into
/// the authoritative fields until aggregation overwrites them.
#[must_use]
pub fn build_candidate(object: &Map<String, Value>) -> MealCandidate {
    let model_macros = MacroTotals {
        calories: coerce_macro(object.get("calories")),
        protein: coerce_macro(object.get("protein")),
        carbs: coerce_macro(object.get("carbs")),
        fats: coerce_macro(object.get("fats")),
    };

    let mut meal = MealCandidate {
        meal_type: first_text(object, MEAL_TYPE_KEYS),
        name: first_text(object, NAME_KEYS),
        ingredients: normalize_all(object.get("ingredients")),
        instructions: normalize_instructions(object.get("instructions")),
        model_macros,
        ..MealCandidate::default()
    };
    meal.set_macros(model_macros);
    meal
}
