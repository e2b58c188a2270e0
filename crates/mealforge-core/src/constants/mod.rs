// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Unit conversions, nutrient identifiers, dataset names, and request limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into logical domains rather than kept in a single
//! flat namespace. Tunable thresholds (tolerances, match ratios) live in the
//! root crate's configuration, not here.

/// Unit conversion constants
pub mod units {
    /// Grams in one avoirdupois ounce
    pub const GRAMS_PER_OUNCE: f64 = 28.3495;

    /// Grams in one pound
    pub const GRAMS_PER_POUND: f64 = 453.592_37;

    /// Grams in one kilogram
    pub const GRAMS_PER_KILOGRAM: f64 = 1000.0;

    /// Reference serving for unbranded nutrition datasets
    pub const REFERENCE_SERVING_GRAMS: f64 = 100.0;

    /// Largest denominator used when rendering quantities as fractions
    pub const MAX_FRACTION_DENOMINATOR: u32 = 8;
}

/// Nutrient identifiers used by `FoodData` Central records
pub mod nutrients {
    /// Energy (kcal)
    pub const ENERGY_KCAL: u32 = 1008;
    /// Protein (g)
    pub const PROTEIN: u32 = 1003;
    /// Total lipid / fat (g)
    pub const FAT: u32 = 1004;
    /// Carbohydrate, by difference (g)
    pub const CARBOHYDRATE: u32 = 1005;
}

/// Dataset names and their ranking weights
pub mod datasets {
    /// Foundation foods
    pub const FOUNDATION: &str = "Foundation";
    /// Standard Reference legacy dataset
    pub const SR_LEGACY: &str = "SR Legacy";
    /// Survey foods
    pub const SURVEY_FNDDS: &str = "Survey (FNDDS)";
    /// Branded consumer products
    pub const BRANDED: &str = "Branded";

    /// Ranking weight for a dataset name (case-insensitive); unknown datasets score zero
    #[must_use]
    pub fn priority_weight(data_type: &str) -> f64 {
        match data_type.trim().to_lowercase().as_str() {
            "foundation" => 3.0,
            "sr legacy" => 2.5,
            "survey (fndds)" => 2.0,
            "branded" => 1.0,
            _ => 0.0,
        }
    }
}

/// Request-shaping limits
pub mod limits {
    /// Maximum meals requested per day-part
    pub const MAX_MEALS_PER_DAY_PART: u32 = 10;

    /// Maximum tokens kept from a normalized ingredient term
    pub const MAX_TERM_TOKENS: usize = 4;

    /// Default number of dinners when no source specifies one
    pub const DEFAULT_DINNER_COUNT: u32 = 1;

    /// Display name for meals the generator left unnamed
    pub const UNTITLED_MEAL_NAME: &str = "(Untitled)";
}

/// Service names used in error messages and log fields
pub mod service_names {
    /// Nutrition fact provider backed by USDA `FoodData` Central
    pub const USDA_API: &str = "USDA API";
    /// Text generation collaborator
    pub const LLM: &str = "LLM";
    /// Service name for structured logging
    pub const MEALFORGE: &str = "mealforge";
}
