// ABOUTME: Calorie rule parsing from form-style operator/value/scope triples
// ABOUTME: Skips unusable rows and reports aggregate-scope rules as unenforced
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use mealforge_core::models::{CalorieOperator, CalorieRule};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Source tag for rules derived from a profile's suggested intake
pub const BIOMETRIC_RULE_SOURCE: &str = "biometric_profile";

/// One unparsed calorie rule as submitted by a client
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalorieRuleInput {
    /// "about", "at least", or "under"
    #[serde(default)]
    pub operator: String,
    /// Target calories; numbers and numeric strings are accepted
    #[serde(default)]
    pub value: Value,
    /// "each meal", "each dinner", "all meals", ...
    #[serde(default)]
    pub scope: String,
}

impl CalorieRuleInput {
    /// Convenience constructor
    #[must_use]
    pub fn new(operator: &str, value: impl Into<Value>, scope: &str) -> Self {
        Self {
            operator: operator.to_owned(),
            value: value.into(),
            scope: scope.to_owned(),
        }
    }

    fn value_text(&self) -> String {
        match &self.value {
            Value::String(text) => text.clone(),
            Value::Number(number) => number
                .as_i64()
                .map_or_else(|| number.to_string(), |int| int.to_string()),
            _ => String::new(),
        }
    }
}

/// Parse every usable rule, logging aggregate rules that will not be enforced
#[must_use]
pub fn parse_calorie_rules(inputs: &[CalorieRuleInput]) -> Vec<CalorieRule> {
    let rules: Vec<CalorieRule> = inputs
        .iter()
        .filter_map(|input| {
            let parsed = CalorieRule::parse(&input.operator, &input.value_text(), &input.scope);
            if parsed.is_none() {
                tracing::debug!(
                    operator = %input.operator,
                    scope = %input.scope,
                    "Skipping unusable calorie rule"
                );
            }
            parsed
        })
        .collect();

    let unsupported: BTreeSet<String> = rules
        .iter()
        .filter(|rule| !rule.is_per_meal())
        .map(|rule| rule.scope.label())
        .collect();
    if !unsupported.is_empty() {
        tracing::warn!(
            scopes = %unsupported.into_iter().collect::<Vec<_>>().join(", "),
            "Calorie goals for totals are not enforced"
        );
    }

    rules
}

/// Rule added when only a profile-suggested per-meal intake is known
#[must_use]
pub fn biometric_rule(calories_per_meal: u32) -> CalorieRule {
    CalorieRule {
        source: Some(BIOMETRIC_RULE_SOURCE.to_owned()),
        ..CalorieRule::per_meal(CalorieOperator::About, calories_per_meal)
    }
}

/// Value of the first per-meal rule that covers every day-part
#[must_use]
pub fn unscoped_per_meal_target(rules: &[CalorieRule]) -> Option<u32> {
    rules
        .iter()
        .find(|rule| rule.is_per_meal() && rule.applies_to(None))
        .map(|rule| rule.value)
}

/// Prompt summaries, marking automatically derived rules
#[must_use]
pub fn rule_summaries(rules: &[CalorieRule]) -> Vec<String> {
    rules
        .iter()
        .map(|rule| {
            if rule.source.as_deref() == Some(BIOMETRIC_RULE_SOURCE) {
                format!("{} (auto from biometrics)", rule.summary())
            } else {
                rule.summary()
            }
        })
        .collect()
}
