// ABOUTME: Constraint merger combining global, user, and request preference tiers
// ABOUTME: Scalars follow request > user > global precedence while list keys are unioned
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::diet::banned_for_diets;
use mealforge_core::constants::limits::{DEFAULT_DINNER_COUNT, MAX_MEALS_PER_DAY_PART};
use mealforge_core::models::{ConstraintSet, DietaryRestriction};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One tier of raw preferences (form fields, stored user record, site defaults)
pub type ConstraintTier = Map<String, Value>;

const BREAKFAST_KEYS: &[&str] = &["num_breakfast", "num1"];
const LUNCH_KEYS: &[&str] = &["num_lunch", "num2"];
const DINNER_KEYS: &[&str] = &["num_dinner", "num3"];
const DIET_KEYS: &[&str] = &["dietary_restrictions", "dietary_restriction"];
const CALORIE_KEYS: &[&str] = &["calories"];

/// Split a list-valued preference into trimmed lowercase entries
///
/// Accepts JSON arrays and comma-separated strings; anything else is empty.
#[must_use]
pub fn coerce_list(value: &Value) -> Vec<String> {
    let items: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Value::String(text) => text.split(',').map(str::to_owned).collect(),
        _ => Vec::new(),
    };
    items
        .into_iter()
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Order-preserving, case-insensitive union of several list values
#[must_use]
pub fn merge_list_values<'a, I>(sources: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .flatten()
        .flat_map(coerce_list)
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn union_terms(lists: [Vec<String>; 2]) -> Vec<String> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Last value for any of the aliases, honouring tier precedence
fn scalar<'a>(tiers: &[&'a ConstraintTier], aliases: &[&str]) -> Option<&'a Value> {
    tiers
        .iter()
        .rev()
        .copied()
        .find_map(|tier| aliases.iter().find_map(|key| tier.get(*key)))
}

fn coerce_count(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(text)) => text.trim().parse().unwrap_or(0),
        Some(Value::Bool(flag)) => i64::from(*flag),
        _ => 0,
    }
}

fn meal_count(tiers: &[&ConstraintTier], aliases: &[&str], default: u32) -> u32 {
    scalar(tiers, aliases).map_or(default, |value| {
        let clamped = coerce_count(Some(value)).clamp(0, i64::from(MAX_MEALS_PER_DAY_PART));
        u32::try_from(clamped).unwrap_or(0)
    })
}

/// Restrictions named by a diet value; the first is the effective restriction
fn restrictions(value: Option<&Value>) -> Vec<DietaryRestriction> {
    let names: Vec<String> = match value {
        Some(Value::String(text)) => vec![text.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    };
    names
        .iter()
        .map(|name| DietaryRestriction::from_str_lossy(name))
        .filter(|restriction| *restriction != DietaryRestriction::None)
        .collect()
}

/// Merge three preference tiers into one sanitized constraint set
///
/// Precedence is `request > user > global` for scalar keys. Banned, disliked,
/// and favorite lists are unioned across tiers, and the banned list is led by
/// the terms excluded by the merged dietary restriction.
#[must_use]
pub fn merge(
    global: &ConstraintTier,
    user: &ConstraintTier,
    request: &ConstraintTier,
) -> ConstraintSet {
    let tiers = [global, user, request];

    let diets = restrictions(scalar(&tiers, DIET_KEYS));
    let dietary_restriction = diets.first().copied().unwrap_or_default();

    let calorie_target =
        u32::try_from(coerce_count(scalar(&tiers, CALORIE_KEYS)).max(0)).unwrap_or(u32::MAX);

    let user_banned = merge_list_values(tiers.iter().map(|tier| tier.get("banned_ingredients")));
    let banned_ingredients = union_terms([banned_for_diets(&diets), user_banned]);

    let constraints = ConstraintSet {
        dietary_restriction,
        breakfast_count: meal_count(&tiers, BREAKFAST_KEYS, 0),
        lunch_count: meal_count(&tiers, LUNCH_KEYS, 0),
        dinner_count: meal_count(&tiers, DINNER_KEYS, DEFAULT_DINNER_COUNT),
        calorie_target,
        banned_ingredients,
        disliked_ingredients: merge_list_values(
            tiers.iter().map(|tier| tier.get("disliked_ingredients")),
        ),
        favorites: merge_list_values(tiers.iter().map(|tier| tier.get("favorites"))),
    };

    tracing::debug!(
        diet = %constraints.dietary_restriction,
        breakfast = constraints.breakfast_count,
        lunch = constraints.lunch_count,
        dinner = constraints.dinner_count,
        calories = constraints.calorie_target,
        banned = constraints.banned_ingredients.len(),
        "Merged constraints"
    );

    constraints
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tier(value: Value) -> ConstraintTier {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_coerce_list_shapes() {
        assert_eq!(coerce_list(&json!("Nuts, ,Shrimp")), vec!["nuts", "shrimp"]);
        assert_eq!(coerce_list(&json!([" Kale ", null])), vec!["kale"]);
        assert!(coerce_list(&json!(5)).is_empty());
    }

    #[test]
    fn test_counts_clamp_and_default() {
        let merged = merge(&tier(json!({"num1": 25})), &Map::new(), &tier(json!({"num2": "-3"})));
        assert_eq!(merged.breakfast_count, 10);
        assert_eq!(merged.lunch_count, 0);
        assert_eq!(merged.dinner_count, 1);
    }
}
