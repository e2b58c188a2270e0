// ABOUTME: Normalized ingredient entry with quantity, unit, and dual gram/ounce weight
// ABOUTME: Weight setters keep grams and ounces derivable from each other
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::units::GRAMS_PER_OUNCE;
use serde::{Deserialize, Serialize};

/// Convert grams to ounces
#[must_use]
pub fn grams_to_ounces(grams: f64) -> f64 {
    grams / GRAMS_PER_OUNCE
}

/// Convert ounces to grams
#[must_use]
pub fn ounces_to_grams(ounces: f64) -> f64 {
    ounces * GRAMS_PER_OUNCE
}

/// A single ingredient after normalization
///
/// Whenever one of `weight_g` / `weight_oz` is set, the other is set too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientEntry {
    /// Cleaned display name
    pub name: String,
    /// Parsed quantity (mixed numbers and fractions collapse to one value)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    /// Quantity rendered as a friendly fraction ("1 1/2")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity_display: Option<String>,
    /// Canonical unit token (tsp, tbsp, cup, g, oz, slice, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Weight in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_g: Option<f64>,
    /// Weight in ounces
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_oz: Option<f64>,
    /// Free-text note ("finely chopped")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Calories stated inline by the generator, e.g. "(120 kcal)"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_calories: Option<u32>,
    /// Backend-computed calorie contribution, rounded to 0.1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    /// Original text as received
    pub raw: String,
}

impl IngredientEntry {
    /// Entry carrying only a display name
    #[must_use]
    pub fn named(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw: raw.into(),
            ..Self::default()
        }
    }

    /// Set both weights from grams
    pub fn set_weight_grams(&mut self, grams: f64) {
        self.weight_g = Some(grams);
        self.weight_oz = Some(grams_to_ounces(grams));
    }

    /// Set both weights from ounces
    pub fn set_weight_ounces(&mut self, ounces: f64) {
        self.weight_oz = Some(ounces);
        self.weight_g = Some(ounces_to_grams(ounces));
    }

    /// True when a usable weight is known
    #[must_use]
    pub fn has_weight(&self) -> bool {
        self.weight_g.is_some_and(|g| g.is_finite() && g >= 0.0)
    }

    /// Name, raw text, and note joined and lowercased for substring checks
    #[must_use]
    pub fn search_text(&self) -> String {
        [Some(self.name.as_str()), Some(self.raw.as_str()), self.note.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// True for placeholder entries that carry no ingredient
    #[must_use]
    pub fn is_blank(&self) -> bool {
        let name = self.name.trim();
        let raw = self.raw.trim();
        (name.is_empty() || name == "-")
            && (raw.is_empty() || raw == "-")
            && self.quantity.is_none()
    }
}
