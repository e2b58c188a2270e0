// ABOUTME: Static ingredient ban tables implied by each dietary restriction
// ABOUTME: Pure expansion from a restriction to the sorted list of excluded terms
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use mealforge_core::models::DietaryRestriction;
use std::collections::BTreeSet;

const MEATS: &[&str] = &[
    "beef", "pork", "ham", "bacon", "sausage", "chicken", "turkey", "duck", "lamb", "veal",
];

const PORK: &[&str] = &[
    "pork", "ham", "bacon", "prosciutto", "pepperoni", "salami", "chorizo", "pancetta",
];

const SHELLFISH: &[&str] = &[
    "shrimp", "lobster", "crab", "clam", "clams", "mussel", "mussels", "oyster", "oysters",
    "scallop", "scallops",
];

const FISH: &[&str] = &[
    "fish", "salmon", "tuna", "anchovy", "anchovies", "sardine", "sardines",
];

const DAIRY: &[&str] = &[
    "milk", "cheese", "butter", "cream", "yogurt", "whey", "casein", "ghee", "half-and-half",
];

const EGGS: &[&str] = &["egg", "eggs"];

const HONEY: &[&str] = &["honey"];

const GLUTEN: &[&str] = &[
    "wheat", "barley", "rye", "spelt", "farro", "semolina", "triticale", "couscous",
    "breadcrumbs", "flour", "seitan",
];

const HIGH_CARBS: &[&str] = &[
    "sugar", "brown sugar", "maple syrup", "agave", "rice", "quinoa", "corn", "beans", "lentils",
    "potato", "potatoes", "bread", "pasta", "oats", "tortilla", "bagel", "cereal",
];

const LEGUMES: &[&str] = &[
    "beans", "lentils", "peas", "peanuts", "peanut butter", "soy", "soybeans", "tofu", "tempeh",
    "edamame", "chickpeas",
];

const REFINED_SWEETS: &[&str] = &[
    "white sugar", "brown sugar", "candy", "soda", "dessert", "cake", "cookies", "donut",
    "pastry",
];

const STARCHY_VEGETABLES: &[&str] = &[
    "potato", "potatoes", "sweet potato", "yams", "cassava", "plantain", "parsnip", "beet",
];

const NON_KOSHER_FISH: &[&str] = &["catfish", "eel", "shark", "octopus", "squid"];

const VEGETARIAN_EXTRAS: &[&str] = &["gelatin", "lard", "fish sauce", "anchovy paste"];

const PESCATARIAN_EXTRAS: &[&str] = &["gelatin", "lard"];

const PALEO_EXTRAS: &[&str] = &[
    "corn syrup", "processed sugar", "processed oil", "soy sauce", "tofu", "tempeh",
    "peanut butter",
];

const KOSHER_EXTRAS: &[&str] = &["gelatin", "lard", "blood sausage"];

fn table_groups(restriction: DietaryRestriction) -> Vec<&'static [&'static str]> {
    match restriction {
        DietaryRestriction::None | DietaryRestriction::Omnivore => Vec::new(),
        DietaryRestriction::Vegetarian => vec![MEATS, SHELLFISH, FISH, VEGETARIAN_EXTRAS],
        DietaryRestriction::Vegan => {
            vec![MEATS, SHELLFISH, FISH, VEGETARIAN_EXTRAS, DAIRY, EGGS, HONEY]
        }
        DietaryRestriction::Pescatarian => vec![MEATS, PESCATARIAN_EXTRAS],
        DietaryRestriction::GlutenFree => vec![GLUTEN],
        DietaryRestriction::Keto => vec![HIGH_CARBS],
        DietaryRestriction::LowCarb => vec![HIGH_CARBS, REFINED_SWEETS, STARCHY_VEGETABLES],
        DietaryRestriction::Paleo => vec![GLUTEN, LEGUMES, DAIRY, REFINED_SWEETS, PALEO_EXTRAS],
        DietaryRestriction::DairyFree => vec![DAIRY],
        DietaryRestriction::Kosher => vec![PORK, SHELLFISH, NON_KOSHER_FISH, KOSHER_EXTRAS],
    }
}

/// Sorted terms excluded by one dietary restriction
#[must_use]
pub fn banned_for_diet(restriction: DietaryRestriction) -> Vec<String> {
    banned_for_diets(&[restriction])
}

/// Sorted union of the terms excluded by several restrictions
#[must_use]
pub fn banned_for_diets(restrictions: &[DietaryRestriction]) -> Vec<String> {
    restrictions
        .iter()
        .flat_map(|restriction| table_groups(*restriction))
        .flat_map(|group| group.iter().copied())
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}
