// ABOUTME: Nutrition fact models: raw provider records, resolved facts, and retrieval batches
// ABOUTME: Facts render prompt fragments used to ground the text generator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One nutrient value on a provider record
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodNutrient {
    /// Nutrient identifier (1008 energy, 1003 protein, ...)
    #[serde(default)]
    pub nutrient_id: u32,
    /// Nutrient name
    #[serde(default)]
    pub nutrient_name: String,
    /// Unit (kcal, g, mg)
    #[serde(default)]
    pub unit_name: String,
    /// Amount per record basis
    #[serde(default)]
    pub value: Option<f64>,
}

/// Raw record returned by a nutrition fact provider search
///
/// Field names follow the `FoodData` Central search payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FoodRecord {
    /// Provider identifier
    pub fdc_id: u64,
    /// Food description
    pub description: String,
    /// Dataset name ("Foundation", "SR Legacy", "Branded", ...)
    pub data_type: String,
    /// Food category label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_category: Option<String>,
    /// Brand owner for branded foods
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_owner: Option<String>,
    /// Declared serving size (branded foods)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<f64>,
    /// Declared serving unit (branded foods)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serving_size_unit: Option<String>,
    /// Nutrient values
    pub food_nutrients: Vec<FoodNutrient>,
}

impl FoodRecord {
    /// Value of the nutrient with the given identifier, if present
    #[must_use]
    pub fn nutrient_value(&self, nutrient_id: u32) -> Option<f64> {
        self.food_nutrients
            .iter()
            .find(|nutrient| nutrient.nutrient_id == nutrient_id)
            .and_then(|nutrient| nutrient.value)
    }
}

/// Authoritative per-serving nutrition for one resolved ingredient
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NutritionFact {
    /// Lowercased provider description
    pub canonical_name: String,
    /// Provider identifier ("fdc:171477")
    pub source_id: String,
    /// "description; category"
    pub summary: String,
    /// Reference serving the macros are expressed against
    pub serving_size_g: f64,
    /// Energy per reference serving
    pub calories: f64,
    /// Protein per reference serving
    pub protein_g: f64,
    /// Carbohydrates per reference serving
    pub carbs_g: f64,
    /// Fat per reference serving
    pub fats_g: f64,
    /// Provenance tags (category, dataset)
    pub tags: Vec<String>,
    /// Match confidence in `[0, 1]`
    pub confidence: f64,
    /// Serving declared on the source record, converted to grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_serving_size_g: Option<f64>,
}

impl NutritionFact {
    /// Linear scale factor for a weight in grams
    #[must_use]
    pub fn scale_for(&self, grams: f64) -> f64 {
        let serving = if self.serving_size_g > 0.0 {
            self.serving_size_g
        } else {
            crate::constants::units::REFERENCE_SERVING_GRAMS
        };
        grams.max(0.0) / serving
    }

    /// Prompt line: `- name (tags): summary [X kcal; P x g; C x g; F x g; serving=N g]`
    #[must_use]
    pub fn to_prompt_fragment(&self) -> String {
        let tag_text = if self.tags.is_empty() {
            String::new()
        } else {
            format!(" ({})", self.tags.join(", "))
        };
        format!(
            "- {}{tag_text}: {} [{:.0} kcal; P {:.1} g; C {:.1} g; F {:.1} g; serving={:.0} g]",
            self.canonical_name,
            self.summary,
            self.calories,
            self.protein_g,
            self.carbs_g,
            self.fats_g,
            self.serving_size_g
        )
    }
}

/// Facts grouped by the query terms that produced them
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RetrievalBatch {
    /// Terms that were queried
    pub query_terms: Vec<String>,
    /// Facts that resolved
    pub facts: Vec<NutritionFact>,
    /// Warnings for unresolved terms
    pub warnings: Vec<String>,
}

impl RetrievalBatch {
    /// Heading used when rendering the batch into a prompt
    pub const DEFAULT_HEADING: &'static str = "Supporting ingredient facts";

    /// Build a batch and record a warning naming every missed term
    #[must_use]
    pub fn from_results(
        query_terms: Vec<String>,
        facts: Vec<NutritionFact>,
        missing: &[String],
    ) -> Self {
        let mut warnings = Vec::new();
        if !missing.is_empty() {
            let unique: BTreeSet<&str> = missing.iter().map(String::as_str).collect();
            warnings.push(format!(
                "No facts available for: {}",
                unique.into_iter().collect::<Vec<_>>().join(", ")
            ));
        }
        Self {
            query_terms,
            facts,
            warnings,
        }
    }

    /// True when no fact resolved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Render the facts as a prompt block; empty when there are none
    #[must_use]
    pub fn to_prompt_block(&self, heading: &str) -> String {
        if self.facts.is_empty() {
            return String::new();
        }
        let fragments = self
            .facts
            .iter()
            .map(NutritionFact::to_prompt_fragment)
            .collect::<Vec<_>>()
            .join("\n");
        format!("{heading}:\n{fragments}")
    }
}
