// ABOUTME: Candidate ranking and record-to-fact conversion for nutrition resolution
// ABOUTME: Token overlap, dataset priority, concision, known-confusion nudges, density checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Candidate scoring
//!
//! `score = 3 * overlap + dataset_weight + 0.5 * concision + nudges`, where
//! overlap and concision are computed on tokens with cooking and portion
//! modifiers removed.

use mealforge_core::constants::{datasets, nutrients, units};
use mealforge_core::models::{FoodRecord, NutritionFact};
use std::collections::BTreeSet;

/// Cooking and portion words ignored when comparing tokens
pub const RESOLVER_MODIFIERS: &[&str] = &[
    "raw", "fresh", "cooked", "boiled", "fried", "baked", "roasted", "grilled", "large", "medium",
    "small", "whole", "chopped", "sliced", "diced", "cup", "tbsp", "tsp",
];

/// Description tokens that excuse a high calorie density
const FAT_TOKENS: &[&str] = &["oil", "butter", "shortening", "lard", "fat"];

const OVERLAP_WEIGHT: f64 = 3.0;
const CONCISION_WEIGHT: f64 = 0.5;
const EGG_PART_PENALTY: f64 = -2.0;

/// Lowercase alphanumeric tokens
#[must_use]
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Tokens with modifiers removed
#[must_use]
pub fn trim_modifiers(tokens: &BTreeSet<String>) -> BTreeSet<String> {
    tokens
        .iter()
        .filter(|token| !RESOLVER_MODIFIERS.contains(&token.as_str()))
        .cloned()
        .collect()
}

/// Share of query tokens present in the description, in `[0, 1]`
#[must_use]
pub fn token_overlap(query: &BTreeSet<String>, description: &BTreeSet<String>) -> f64 {
    let query = trim_modifiers(query);
    let description = trim_modifiers(description);
    if query.is_empty() || description.is_empty() {
        return 0.0;
    }
    query.intersection(&description).count() as f64 / query.len() as f64
}

fn concision(query: &BTreeSet<String>, description: &BTreeSet<String>) -> f64 {
    let query = trim_modifiers(query);
    let description = trim_modifiers(description);
    if description.is_empty() {
        return 0.0;
    }
    (query.len() as f64 / description.len() as f64).min(1.0)
}

fn nudges(query: &BTreeSet<String>, description: &BTreeSet<String>) -> f64 {
    let wants_egg = query.contains("egg") || query.contains("eggs");
    let asks_for_part = query.contains("white") || query.contains("yolk");
    let offers_part = description.contains("white") || description.contains("yolk");
    if wants_egg && offers_part && !asks_for_part {
        EGG_PART_PENALTY
    } else {
        0.0
    }
}

/// Ranking of one candidate against a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    /// Trimmed token overlap
    pub overlap: f64,
    /// Composite score
    pub score: f64,
}

/// Score one record against the query tokens
#[must_use]
pub fn score_candidate(query: &BTreeSet<String>, record: &FoodRecord) -> CandidateScore {
    let description = tokenize(&record.description);
    let overlap = token_overlap(query, &description);
    let score = OVERLAP_WEIGHT.mul_add(
        overlap,
        datasets::priority_weight(&record.data_type)
            + CONCISION_WEIGHT * concision(query, &description)
            + nudges(query, &description),
    );
    CandidateScore { overlap, score }
}

/// Chosen candidate and whether it cleared the match threshold
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    /// Picked record
    pub record: &'a FoodRecord,
    /// Its ranking
    pub score: CandidateScore,
    /// False when no candidate cleared the threshold
    pub confident: bool,
}

/// Highest `(overlap, score)` candidate, preferring those at or above `min_match_ratio`
#[must_use]
pub fn select_candidate<'a>(
    query: &BTreeSet<String>,
    records: &'a [FoodRecord],
    min_match_ratio: f64,
) -> Option<Selection<'a>> {
    let scored: Vec<(&FoodRecord, CandidateScore)> = records
        .iter()
        .map(|record| (record, score_candidate(query, record)))
        .collect();

    if let Some((record, score)) = best_of(
        scored
            .iter()
            .copied()
            .filter(|(_, score)| score.overlap >= min_match_ratio),
    ) {
        return Some(Selection {
            record,
            score,
            confident: true,
        });
    }
    best_of(scored.into_iter()).map(|(record, score)| Selection {
        record,
        score,
        confident: false,
    })
}

fn best_of<'a>(
    pool: impl Iterator<Item = (&'a FoodRecord, CandidateScore)>,
) -> Option<(&'a FoodRecord, CandidateScore)> {
    pool.max_by(|(_, a), (_, b)| {
        a.overlap
            .total_cmp(&b.overlap)
            .then_with(|| a.score.total_cmp(&b.score))
    })
}

/// Declared serving in grams, when the unit is convertible
#[must_use]
pub fn serving_size_grams(record: &FoodRecord) -> Option<f64> {
    let size = record.serving_size.filter(|size| *size > 0.0)?;
    let unit = record.serving_size_unit.as_deref()?.trim().to_lowercase();
    let factor = match unit.as_str() {
        "g" | "gram" | "grams" => 1.0,
        "oz" | "ounce" | "ounces" => units::GRAMS_PER_OUNCE,
        "lb" | "pound" | "pounds" => units::GRAMS_PER_POUND,
        "kg" | "kilogram" | "kilograms" => units::GRAMS_PER_KILOGRAM,
        _ => return None,
    };
    Some(size * factor)
}

/// Convert a record to a fact, or `None` when it is unusable
///
/// Records without positive energy are dropped, as are records denser than
/// `density_ceiling` kcal/g unless the description names a fat or oil.
#[must_use]
pub fn record_to_fact(
    query: &str,
    record: &FoodRecord,
    density_ceiling: f64,
) -> Option<NutritionFact> {
    let calories = record
        .nutrient_value(nutrients::ENERGY_KCAL)
        .filter(|kcal| *kcal > 0.0)?;

    let declared = serving_size_grams(record);
    let is_branded = record.data_type.eq_ignore_ascii_case(datasets::BRANDED);
    let basis = if is_branded {
        declared.unwrap_or(units::REFERENCE_SERVING_GRAMS)
    } else {
        units::REFERENCE_SERVING_GRAMS
    };

    let description_tokens = tokenize(&record.description);
    let names_fat = FAT_TOKENS
        .iter()
        .any(|token| description_tokens.contains(*token));
    if calories / basis > density_ceiling && !names_fat {
        return None;
    }

    let description = record.description.trim();
    let category = record.food_category.as_deref().unwrap_or("").trim();
    let summary = match (description.is_empty(), category.is_empty()) {
        (true, true) => "Nutrition facts".to_owned(),
        (false, true) => description.to_owned(),
        (true, false) => category.to_owned(),
        (false, false) => format!("{description}; {category}"),
    };
    let canonical_name = if description.is_empty() {
        query.trim().to_lowercase()
    } else {
        description.to_lowercase()
    };
    let tags = [category, record.data_type.trim()]
        .into_iter()
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect();

    Some(NutritionFact {
        canonical_name,
        source_id: format!("fdc:{}", record.fdc_id),
        summary,
        serving_size_g: basis,
        calories,
        protein_g: record.nutrient_value(nutrients::PROTEIN).unwrap_or(0.0),
        carbs_g: record.nutrient_value(nutrients::CARBOHYDRATE).unwrap_or(0.0),
        fats_g: record.nutrient_value(nutrients::FAT).unwrap_or(0.0),
        tags,
        confidence: 1.0,
        source_serving_size_g: declared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealforge_core::models::FoodNutrient;

    fn record(fdc_id: u64, description: &str, data_type: &str, kcal: f64) -> FoodRecord {
        FoodRecord {
            fdc_id,
            description: description.to_owned(),
            data_type: data_type.to_owned(),
            food_nutrients: vec![FoodNutrient {
                nutrient_id: nutrients::ENERGY_KCAL,
                value: Some(kcal),
                ..FoodNutrient::default()
            }],
            ..FoodRecord::default()
        }
    }

    #[test]
    fn test_overlap_ignores_modifiers() {
        let query = tokenize("large raw eggs");
        let description = tokenize("Eggs, Grade A");
        assert!((token_overlap(&query, &description) - 1.0).abs() < f64::EPSILON);
        assert!(token_overlap(&tokenize("raw"), &description).abs() < f64::EPSILON);
    }

    #[test]
    fn test_egg_query_avoids_egg_white() {
        let records = vec![
            record(1, "Egg, white, raw, fresh", "Foundation", 52.0),
            record(2, "Egg, whole, raw, fresh", "SR Legacy", 143.0),
        ];
        let picked = select_candidate(&tokenize("egg"), &records, 0.4);
        assert_eq!(picked.map(|s| s.record.fdc_id), Some(2));
    }

    #[test]
    fn test_density_ceiling_spares_oils() {
        let powder = record(1, "Mystery powder", "Foundation", 900.0);
        assert!(record_to_fact("sugar", &powder, 6.5).is_none());
        assert!(record_to_fact("olive oil", &record(2, "Oil, olive", "Foundation", 884.0), 6.5).is_some());
    }

    #[test]
    fn test_branded_basis_uses_declared_serving() {
        let mut granola = record(9, "Granola bar", "Branded", 190.0);
        granola.serving_size = Some(1.5);
        granola.serving_size_unit = Some("oz".to_owned());
        let fact = record_to_fact("granola bar", &granola, 6.5);
        let serving = fact.map(|f| f.serving_size_g).unwrap_or_default();
        assert!((serving - 42.524_25).abs() < 1e-6);
    }
}
