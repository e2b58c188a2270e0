// ABOUTME: Profile collaborator interface supplying stored constraints and suggested intake
// ABOUTME: Includes a plain-data profile for callers that already hold the values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read-only view of a user profile
///
/// Every accessor is optional; an implementation returns `None` for anything it
/// cannot provide.
pub trait ProfileSource: Send + Sync {
    /// Stored preference record, used as the `user` constraint tier
    fn constraint_record(&self) -> Option<Map<String, Value>> {
        None
    }

    /// Per-meal calorie figure derived from the user's biometrics
    fn suggested_calories_per_meal(&self) -> Option<u32> {
        None
    }

    /// Free text placed ahead of the generation prompt
    fn prompt_preamble(&self) -> Option<String> {
        None
    }
}

/// Profile backed by values supplied up front
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StaticProfile {
    /// Stored preference record
    #[serde(default)]
    pub constraints: Map<String, Value>,
    /// Suggested per-meal calories
    #[serde(default)]
    pub calories_per_meal: Option<u32>,
    /// Prompt preamble
    #[serde(default)]
    pub preamble: Option<String>,
}

impl ProfileSource for StaticProfile {
    fn constraint_record(&self) -> Option<Map<String, Value>> {
        (!self.constraints.is_empty()).then(|| self.constraints.clone())
    }

    fn suggested_calories_per_meal(&self) -> Option<u32> {
        self.calories_per_meal.filter(|calories| *calories > 0)
    }

    fn prompt_preamble(&self) -> Option<String> {
        self.preamble
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_owned)
    }
}
