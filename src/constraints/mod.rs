// ABOUTME: Constraint module: tier merging, diet ban tables, calorie rules, profile access
// ABOUTME: Produces the sanitized constraint set and rule list for one generation request
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Constraints
//!
//! Constraint objects are built fresh for every request and passed by value;
//! there is no shared registry.

/// Static ingredient bans per dietary restriction
pub mod diet;

/// Three-tier preference merge
pub mod merger;

/// Profile collaborator trait
pub mod profile;

/// Calorie rule parsing
pub mod rules;

pub use diet::{banned_for_diet, banned_for_diets};
pub use merger::{coerce_list, merge, merge_list_values, ConstraintTier};
pub use profile::{ProfileSource, StaticProfile};
pub use rules::{
    biometric_rule, parse_calorie_rules, rule_summaries, unscoped_per_meal_target,
    CalorieRuleInput, BIOMETRIC_RULE_SOURCE,
};
