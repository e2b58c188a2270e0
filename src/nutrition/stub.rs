// ABOUTME: In-memory fact provider over a fixed record list for tests and offline runs
// ABOUTME: Matches records whose descriptions contain every query word
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::provider::FactProvider;
use super::scoring::tokenize;
use async_trait::async_trait;
use mealforge_core::constants::{datasets, nutrients};
use mealforge_core::errors::{AppError, AppResult};
use mealforge_core::models::{FoodNutrient, FoodRecord};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fact provider answering from records held in memory
#[derive(Debug, Default)]
pub struct StubFactProvider {
    records: Vec<FoodRecord>,
    searches: AtomicUsize,
}

impl StubFactProvider {
    /// Provider over the given records
    #[must_use]
    pub fn new(records: Vec<FoodRecord>) -> Self {
        Self {
            records,
            searches: AtomicUsize::new(0),
        }
    }

    /// Provider seeded with a small set of common whole foods
    #[must_use]
    pub fn with_standard_records() -> Self {
        Self::new(standard_records())
    }

    /// Load records from a JSON file holding either an array or `{"foods": [...]}`
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or is not a record list
    pub fn from_json_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AppError::invalid_input(format!("Cannot read {}: {e}", path.display()))
        })?;
        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| AppError::serialization(format!("Invalid fact file: {e}")))?;
        let list = value.get("foods").cloned().unwrap_or(value);
        let records: Vec<FoodRecord> = serde_json::from_value(list)
            .map_err(|e| AppError::serialization(format!("Invalid fact records: {e}")))?;
        Ok(Self::new(records))
    }

    /// Number of searches served so far
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::Relaxed)
    }

    fn matches(query: &[String], record: &FoodRecord) -> bool {
        let description = tokenize(&record.description);
        query.iter().all(|word| {
            description.contains(word)
                || description.contains(&format!("{word}s"))
                || word
                    .strip_suffix('s')
                    .is_some_and(|singular| description.contains(singular))
        })
    }
}

#[async_trait]
impl FactProvider for StubFactProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn search(
        &self,
        term: &str,
        page_size: u32,
        data_types: &[String],
    ) -> AppResult<Vec<FoodRecord>> {
        self.searches.fetch_add(1, Ordering::Relaxed);
        let query: Vec<String> = tokenize(term).into_iter().collect();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .records
            .iter()
            .filter(|record| {
                data_types.is_empty()
                    || data_types
                        .iter()
                        .any(|data_type| data_type.eq_ignore_ascii_case(&record.data_type))
            })
            .filter(|record| Self::matches(&query, record))
            .take(page_size as usize)
            .cloned()
            .collect())
    }
}

fn food(
    fdc_id: u64,
    description: &str,
    data_type: &str,
    category: &str,
    macros: [f64; 4],
) -> FoodRecord {
    let [calories, protein, carbs, fat] = macros;
    let nutrient = |nutrient_id, name: &str, unit: &str, value| FoodNutrient {
        nutrient_id,
        nutrient_name: name.to_owned(),
        unit_name: unit.to_owned(),
        value: Some(value),
    };
    FoodRecord {
        fdc_id,
        description: description.to_owned(),
        data_type: data_type.to_owned(),
        food_category: Some(category.to_owned()),
        food_nutrients: vec![
            nutrient(nutrients::PROTEIN, "Protein", "G", protein),
            nutrient(nutrients::FAT, "Total lipid (fat)", "G", fat),
            nutrient(nutrients::CARBOHYDRATE, "Carbohydrate, by difference", "G", carbs),
            nutrient(nutrients::ENERGY_KCAL, "Energy", "KCAL", calories),
        ],
        ..FoodRecord::default()
    }
}

/// Common whole foods with per-100 g macros `[kcal, protein, carbs, fat]`
#[must_use]
#[rustfmt::skip]
pub fn standard_records() -> Vec<FoodRecord> {
    use datasets::{FOUNDATION, SR_LEGACY};
    vec![
        food(171_477, "Chicken, breast, meat only, cooked, roasted", SR_LEGACY, "Poultry Products", [165.0, 31.02, 0.0, 3.57]),
        food(171_688, "Apples, raw, with skin", SR_LEGACY, "Fruits and Fruit Juices", [52.0, 0.26, 13.81, 0.17]),
        food(748_967, "Eggs, Grade A, Large, egg whole", FOUNDATION, "Dairy and Egg Products", [143.0, 12.56, 0.72, 9.51]),
        food(747_997, "Eggs, Grade A, Large, egg white", FOUNDATION, "Dairy and Egg Products", [52.0, 10.9, 0.73, 0.17]),
        food(171_413, "Oil, olive, salad or cooking", SR_LEGACY, "Fats and Oils", [884.0, 0.0, 0.0, 100.0]),
        food(169_756, "Rice, white, long-grain, regular, enriched, cooked", SR_LEGACY, "Cereal Grains and Pasta", [130.0, 2.69, 28.17, 0.28]),
        food(173_904, "Oats", SR_LEGACY, "Breakfast Cereals", [389.0, 16.89, 66.27, 6.9]),
        food(173_944, "Bananas, raw", SR_LEGACY, "Fruits and Fruit Juices", [89.0, 1.09, 22.84, 0.33]),
        food(172_475, "Tofu, raw, firm, prepared with calcium sulfate", SR_LEGACY, "Legumes and Legume Products", [144.0, 17.27, 2.78, 8.72]),
        food(168_462, "Spinach, raw", SR_LEGACY, "Vegetables and Vegetable Products", [23.0, 2.86, 3.63, 0.39]),
        food(175_237, "Beans, black, mature seeds, cooked, boiled, without salt", SR_LEGACY, "Legumes and Legume Products", [132.0, 8.86, 23.71, 0.54]),
        food(169_640, "Honey", SR_LEGACY, "Sweets", [304.0, 0.3, 82.4, 0.0]),
        food(175_167, "Fish, salmon, Atlantic, farmed, cooked, dry heat", SR_LEGACY, "Finfish and Shellfish Products", [206.0, 22.1, 0.0, 12.35]),
        food(170_285, "Sweet potato, cooked, baked in skin, flesh, without salt", SR_LEGACY, "Vegetables and Vegetable Products", [90.0, 2.01, 20.71, 0.15]),
        food(170_567, "Nuts, almonds", SR_LEGACY, "Nut and Seed Products", [579.0, 21.15, 21.55, 49.93]),
        food(174_832, "Beverages, almond milk, unsweetened, shelf stable", SR_LEGACY, "Beverages", [15.0, 0.59, 0.58, 1.1]),
        food(170_903, "Quinoa, cooked", SR_LEGACY, "Cereal Grains and Pasta", [120.0, 4.4, 21.3, 1.92]),
        food(170_393, "Broccoli, raw", SR_LEGACY, "Vegetables and Vegetable Products", [34.0, 2.82, 6.64, 0.37]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_requires_all_words() {
        let provider = StubFactProvider::with_standard_records();
        let types = vec![datasets::SR_LEGACY.to_owned()];
        let hits = provider.search("chicken breast", 8, &types).await.unwrap_or_default();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].fdc_id, 171_477);

        let none = provider.search("chicken thigh", 8, &types).await.unwrap_or_default();
        assert!(none.is_empty());
        assert_eq!(provider.search_count(), 2);
    }

    #[tokio::test]
    async fn test_search_filters_datasets() {
        let provider = StubFactProvider::with_standard_records();
        let foundation = vec![datasets::FOUNDATION.to_owned()];
        let hits = provider.search("egg", 8, &foundation).await.unwrap_or_default();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|r| r.data_type == datasets::FOUNDATION));
    }
}
