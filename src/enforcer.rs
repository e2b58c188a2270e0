// ABOUTME: Applies hard constraints to aggregated meals: structure, banned terms, calorie rules
// ABOUTME: Truncates survivors per day-part to the requested counts in generation order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Constraint Enforcement
//!
//! A meal is checked in a fixed order and the first failure is recorded:
//!
//! 1. it must keep at least one ingredient after blank entries are dropped;
//! 2. no ingredient text may contain a banned term (plant milks are exempt
//!    from a `milk` ban);
//! 3. its aggregated calories must satisfy every applicable per-meal rule.
//!
//! Survivors are then truncated per day-part to the requested counts.

use crate::config::CalorieToleranceConfig;
use crate::constants::limits::UNTITLED_MEAL_NAME;
use crate::logging::PipelineLogger;
use mealforge_core::models::{CalorieRule, ConstraintSet, DayPart, MealCandidate};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Plant milks that a plain `milk` ban does not exclude
pub const PLANT_MILK_ALLOW_LIST: &[&str] = &[
    "almond milk",
    "soy milk",
    "oat milk",
    "coconut milk",
    "cashew milk",
    "hemp milk",
    "pea milk",
    "rice milk",
];

/// Why a meal was excluded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// Nothing left after dropping blank ingredients
    NoIngredients,
    /// An ingredient contains a banned term
    BannedIngredient {
        /// Banned term that matched
        term: String,
        /// Offending ingredient text
        ingredient: String,
    },
    /// Aggregated calories violate a per-meal rule
    CalorieRule {
        /// Violated rule
        rule: CalorieRule,
        /// Calories of the meal when it was checked
        calories: i64,
    },
}

impl RejectionReason {
    /// The violated calorie rule, if that is why the meal was rejected
    #[must_use]
    pub const fn calorie_rule(&self) -> Option<&CalorieRule> {
        match self {
            Self::CalorieRule { rule, .. } => Some(rule),
            _ => None,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoIngredients => f.write_str("no ingredients"),
            Self::BannedIngredient { term, ingredient } => {
                write!(f, "banned ingredient \"{ingredient}\" (matched term \"{term}\")")
            }
            Self::CalorieRule { rule, calories } => write!(
                f,
                "{calories} kcal vs {} {}",
                rule.operator.text(),
                rule.value
            ),
        }
    }
}

/// A rejected meal with its reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    /// The meal as it was when rejected
    pub meal: MealCandidate,
    /// First violated constraint
    pub reason: RejectionReason,
}

/// Result of one enforcement pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnforcementOutcome {
    /// Meals that satisfied every constraint, after truncation
    pub kept: Vec<MealCandidate>,
    /// Meals that violated a constraint, in generation order
    pub rejected: Vec<Rejection>,
    /// Valid meals dropped because their day-part or the total was full
    pub truncated: usize,
}

impl EnforcementOutcome {
    /// Rejections caused by calorie rules
    pub fn calorie_violations(&self) -> impl Iterator<Item = &Rejection> {
        self.rejected
            .iter()
            .filter(|rejection| rejection.reason.calorie_rule().is_some())
    }
}

/// Applies one request's constraints to candidate meals
#[derive(Debug, Clone, Copy)]
pub struct ConstraintEnforcer<'a> {
    constraints: &'a ConstraintSet,
    rules: &'a [CalorieRule],
    tolerance: &'a CalorieToleranceConfig,
}

impl<'a> ConstraintEnforcer<'a> {
    /// Create an enforcer
    #[must_use]
    pub const fn new(
        constraints: &'a ConstraintSet,
        rules: &'a [CalorieRule],
        tolerance: &'a CalorieToleranceConfig,
    ) -> Self {
        Self {
            constraints,
            rules,
            tolerance,
        }
    }

    /// Default the name and drop blank ingredients
    pub fn clean(meal: &mut MealCandidate) {
        let name = meal.name.trim();
        meal.name = if name.is_empty() {
            UNTITLED_MEAL_NAME.to_owned()
        } else {
            name.to_owned()
        };
        meal.meal_type = meal.meal_type.trim().to_owned();
        meal.ingredients.retain(|entry| !entry.is_blank());
    }

    /// First banned term found in the meal, with the ingredient that holds it
    #[must_use]
    pub fn banned_hit(&self, meal: &MealCandidate) -> Option<(String, String)> {
        let banned = &self.constraints.banned_ingredients;
        if banned.is_empty() {
            return None;
        }
        meal.ingredients.iter().find_map(|entry| {
            let haystack = entry.search_text();
            banned
                .iter()
                .filter(|term| !term.is_empty() && haystack.contains(term.as_str()))
                .find(|term| {
                    !(term.as_str() == "milk"
                        && PLANT_MILK_ALLOW_LIST
                            .iter()
                            .any(|allowed| haystack.contains(allowed)))
                })
                .map(|term| {
                    let text = if entry.raw.trim().is_empty() {
                        entry.name.clone()
                    } else {
                        entry.raw.trim().to_owned()
                    };
                    (term.clone(), text)
                })
        })
    }

    /// First applicable per-meal rule the meal's calories violate
    #[must_use]
    pub fn calorie_violation(&self, meal: &MealCandidate) -> Option<&'a CalorieRule> {
        let day_part = meal.day_part();
        self.rules.iter().find(|rule| {
            rule.applies_to(day_part)
                && rule.is_violated_by(meal.calories, self.tolerance.tolerance_for(rule.value))
        })
    }

    /// Clean a meal and check it against every constraint
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn check(&self, meal: &mut MealCandidate) -> Result<(), RejectionReason> {
        Self::clean(meal);
        if meal.ingredients.is_empty() {
            return Err(RejectionReason::NoIngredients);
        }
        if let Some((term, ingredient)) = self.banned_hit(meal) {
            return Err(RejectionReason::BannedIngredient { term, ingredient });
        }
        if let Some(rule) = self.calorie_violation(meal) {
            return Err(RejectionReason::CalorieRule {
                rule: rule.clone(),
                calories: meal.calories,
            });
        }
        Ok(())
    }

    /// Partition meals into kept and rejected, then truncate the kept list
    #[must_use]
    pub fn filter(&self, meals: Vec<MealCandidate>) -> EnforcementOutcome {
        let mut survivors = Vec::with_capacity(meals.len());
        let mut rejected = Vec::new();
        for mut meal in meals {
            match self.check(&mut meal) {
                Ok(()) => survivors.push(meal),
                Err(reason) => {
                    PipelineLogger::log_rejection(&meal.name, &reason.to_string());
                    rejected.push(Rejection { meal, reason });
                }
            }
        }

        let before = survivors.len();
        let kept = truncate_to_counts(survivors, self.constraints);
        EnforcementOutcome {
            truncated: before - kept.len(),
            kept,
            rejected,
        }
    }
}

/// Keep meals in order until each day-part and the total are full
///
/// Untagged meals count only against the total. A request for zero meals
/// keeps everything.
#[must_use]
pub fn truncate_to_counts(
    meals: Vec<MealCandidate>,
    constraints: &ConstraintSet,
) -> Vec<MealCandidate> {
    let total = constraints.total_requested() as usize;
    if total == 0 {
        return meals;
    }

    let mut counts: HashMap<DayPart, u32> = HashMap::new();
    let mut kept = Vec::with_capacity(total);
    for meal in meals {
        if kept.len() >= total {
            break;
        }
        if let Some(day_part) = meal.day_part() {
            let used = counts.entry(day_part).or_insert(0);
            if *used >= constraints.count_for(day_part) {
                debug!(meal.name = %meal.name, day_part = %day_part, "Dropping excess meal");
                continue;
            }
            *used += 1;
        }
        kept.push(meal);
    }
    kept
}
