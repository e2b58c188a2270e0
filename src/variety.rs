// ABOUTME: Chooses the flavor focus for a request from favorites or rotating cuisine presets
// ABOUTME: Pre-fetches facts for the focus terms and renders the prompt's variety cue
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Variety Focus
//!
//! User favorites lead the focus. Without favorites, or when none of them
//! resolves to a nutrition fact, a cuisine preset is picked from the
//! requested counts so that different plans lean on different pantries.

use crate::nutrition::NutritionResolver;
use mealforge_core::models::{ConstraintSet, DayPart, RetrievalBatch};
use std::collections::HashSet;
use tracing::{debug, info};

/// A cuisine theme with its anchor ingredients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarietyPreset {
    /// Theme description shown to the generator
    pub label: &'static str,
    /// Anchor ingredients
    pub terms: &'static [&'static str],
}

/// Rotating cuisine themes
pub const VARIETY_PRESETS: [VarietyPreset; 4] = [
    VarietyPreset {
        label: "Mediterranean market bowls with herbs, citrus, and legumes",
        terms: &["farro", "kalamata olives", "sumac", "chickpeas"],
    },
    VarietyPreset {
        label: "Latin-inspired roasted meals with smoky sauces",
        terms: &["achiote paste", "black beans", "plantain", "chimichurri"],
    },
    VarietyPreset {
        label: "East Asian comfort dishes that balance umami and freshness",
        terms: &["gochujang", "shiitake mushrooms", "soba noodles", "bok choy"],
    },
    VarietyPreset {
        label: "Spiced North African stews with grains and bright toppings",
        terms: &["harissa", "preserved lemon", "pearl couscous", "chickpeas"],
    },
];

const DISTINCT_DAY_PARTS_CUE: &str = "Make breakfast, lunch, and dinner feel distinct with different primary proteins or cuisines; avoid repeating the same entree twice.";

/// Trim, drop empties, dedupe case-insensitively, and cap at `limit`
#[must_use]
pub fn dedupe_terms(terms: &[String], limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    terms
        .iter()
        .map(|term| term.trim())
        .filter(|term| !term.is_empty() && seen.insert(term.to_lowercase()))
        .take(limit)
        .map(str::to_owned)
        .collect()
}

/// Preset chosen from the requested counts
#[must_use]
pub fn preset_for(constraints: &ConstraintSet) -> &'static VarietyPreset {
    let weight = constraints.count_for(DayPart::Breakfast) as usize
        + 2 * constraints.count_for(DayPart::Lunch) as usize
        + 3 * constraints.count_for(DayPart::Dinner) as usize;
    &VARIETY_PRESETS[weight % VARIETY_PRESETS.len()]
}

/// Flavor focus of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarietyFocus {
    /// Terms the prompt highlights
    pub terms: Vec<String>,
    /// Preset label when the terms came from a preset
    pub label: Option<&'static str>,
    /// Favorites the user supplied, deduped
    pub manual_terms: Vec<String>,
    /// Whether `terms` are the user's favorites
    pub uses_favorites: bool,
}

impl VarietyFocus {
    /// Favorites when present, otherwise the preset for these counts
    #[must_use]
    pub fn select(favorites: &[String], constraints: &ConstraintSet, limit: usize) -> Self {
        let manual_terms = dedupe_terms(favorites, limit);
        if manual_terms.is_empty() {
            return Self::from_preset(constraints, limit, manual_terms);
        }
        Self {
            terms: manual_terms.clone(),
            label: None,
            manual_terms,
            uses_favorites: true,
        }
    }

    fn from_preset(constraints: &ConstraintSet, limit: usize, manual_terms: Vec<String>) -> Self {
        let preset = preset_for(constraints);
        Self {
            terms: preset
                .terms
                .iter()
                .take(limit)
                .map(|term| (*term).to_owned())
                .collect(),
            label: Some(preset.label),
            manual_terms,
            uses_favorites: false,
        }
    }

    /// Switch to the preset, keeping the favorites as a flavor cue
    #[must_use]
    pub fn fall_back_to_preset(self, constraints: &ConstraintSet, limit: usize) -> Self {
        Self::from_preset(constraints, limit, self.manual_terms)
    }

    /// Variety sentence for the prompt
    #[must_use]
    pub fn context(&self, distinct_day_parts: bool) -> Option<String> {
        let cue = (!self.manual_terms.is_empty())
            .then(|| format!("User flavor cue: {}", self.manual_terms.join(", ")));

        let context = if self.terms.is_empty() {
            cue
        } else {
            let anchors = self.terms.join(", ");
            if self.uses_favorites {
                Some(format!("User favorites to incorporate: {anchors}"))
            } else {
                let base = match self.label {
                    Some(label) => format!(
                        "Flavor inspiration: {label}. Highlight these pantry anchors: {anchors}"
                    ),
                    None => format!("Highlight these pantry anchors: {anchors}"),
                };
                Some(match cue {
                    Some(cue) => format!("{cue}. {base}"),
                    None => base,
                })
            }
        }?;

        Some(if distinct_day_parts {
            format!("{context}. {DISTINCT_DAY_PARTS_CUE}")
        } else {
            context
        })
    }
}

async fn fetch_focus_facts(
    resolver: &mut NutritionResolver,
    terms: &[String],
) -> Option<RetrievalBatch> {
    if terms.is_empty() {
        return None;
    }
    let batch = resolver.fetch(terms).await;
    if batch.facts.is_empty() {
        info!(terms = %terms.join(", "), "No ingredient facts found for variety focus");
    } else {
        debug!(terms = %terms.join(", "), facts = batch.facts.len(), "Retrieved variety facts");
    }
    Some(batch)
}

/// Choose the focus for a request and pre-fetch facts for its terms
///
/// Favorites that yield no facts at all are replaced by the preset.
pub async fn plan_variety(
    resolver: &mut NutritionResolver,
    constraints: &ConstraintSet,
    limit: usize,
) -> (VarietyFocus, Option<RetrievalBatch>) {
    let focus = VarietyFocus::select(&constraints.favorites, constraints, limit);
    let batch = fetch_focus_facts(resolver, &focus.terms).await;

    let lacks_facts = !batch.as_ref().is_some_and(|batch| !batch.facts.is_empty());
    if focus.uses_favorites && lacks_facts {
        info!("Falling back to a variety preset because favorites lacked ingredient matches");
        let focus = focus.fall_back_to_preset(constraints, limit);
        let batch = fetch_focus_facts(resolver, &focus.terms).await;
        return (focus, batch);
    }
    (focus, batch)
}
