// ABOUTME: Integration tests for macro recomputation from resolved ingredient facts
// ABOUTME: Verifies backend totals replace generator figures and gaps are reported
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{init_test_logging, resolver_for, stub_provider};
use mealforge::aggregator::{aggregate, aggregate_all};
use mealforge::ingredients::build_candidate;
use mealforge::models::{MacroSource, MacroTotals, MealCandidate};
use serde_json::json;

fn candidate(ingredients: &[&str], calories: i64) -> MealCandidate {
    let object = json!({
        "mealType": "dinner",
        "name": "Test Bowl",
        "ingredients": ingredients,
        "instructions": ["Cook"],
        "calories": calories,
        "protein": 5,
        "carbs": 5,
        "fats": 5
    });
    build_candidate(object.as_object().unwrap())
}

#[tokio::test]
async fn test_backend_totals_overwrite_generator_macros() {
    init_test_logging();
    let mut resolver = resolver_for(stub_provider());
    let mut meal = candidate(&["200 g tofu"], 999);

    aggregate(&mut meal, &mut resolver).await;

    assert_eq!(
        meal.macros(),
        MacroTotals {
            calories: 288,
            protein: 35,
            carbs: 6,
            fats: 17
        }
    );
    assert_eq!(meal.model_macros.calories, 999);
    assert_eq!(meal.macro_source, MacroSource::LiveLookup);
    assert_eq!(meal.contributions.len(), 1);
    assert_eq!(meal.contributions[0].ingredient, "tofu");
    assert_eq!(meal.contributions[0].source_id, "fdc:172475");
    assert_eq!(meal.ingredients[0].calories, Some(288.0));
}

#[tokio::test]
async fn test_gaps_and_condiments() {
    init_test_logging();
    let mut resolver = resolver_for(stub_provider());
    let mut meal = candidate(
        &[
            "200 g tofu",
            "1 cup spinach (30 g)",
            "salt to taste",
            "2 cups mystery greens",
            "100 g dragonfruit",
        ],
        700,
    );

    aggregate(&mut meal, &mut resolver).await;

    assert_eq!(meal.calories, 295);
    assert_eq!(meal.protein, 35);
    assert_eq!(meal.carbs, 7);
    assert_eq!(meal.fats, 18);
    assert_eq!(meal.gaps, vec!["mystery greens", "dragonfruit"]);
    assert_eq!(meal.contributions.len(), 2);
    assert!((meal.contributions[1].calories - 6.9).abs() < 1e-9);
    assert!((meal.contributions[1].grams - 30.0).abs() < 1e-9);
    assert!(meal.ingredients[2].calories.is_none());
}

#[tokio::test]
async fn test_nothing_resolved_keeps_generator_figures() {
    init_test_logging();
    let mut resolver = resolver_for(stub_provider());
    let mut meal = candidate(&["a pinch of love", "3 cups starlight"], 450);

    aggregate(&mut meal, &mut resolver).await;

    assert_eq!(meal.calories, 450);
    assert_eq!(meal.protein, 5);
    assert_eq!(meal.macro_source, MacroSource::Unverified);
    assert!(meal.contributions.is_empty());
    assert_eq!(meal.gaps.len(), 2);
}

#[tokio::test]
async fn test_seeded_facts_tag_cached_lookup() {
    init_test_logging();
    let provider = stub_provider();
    let tofu = resolver_for(provider.clone()).resolve("tofu").await.unwrap();

    let mut resolver = resolver_for(provider);
    resolver.seed("tofu", tofu);
    let mut meals = vec![
        candidate(&["150 g tofu"], 100),
        candidate(&["100 g quinoa"], 100),
    ];

    aggregate_all(&mut meals, &mut resolver).await;

    assert_eq!(meals[0].macro_source, MacroSource::CachedLookup);
    assert_eq!(meals[0].calories, 216);
    assert_eq!(meals[1].macro_source, MacroSource::LiveLookup);
    assert_eq!(meals[1].calories, 120);
}

#[tokio::test]
async fn test_aggregation_is_repeatable() {
    init_test_logging();
    let mut resolver = resolver_for(stub_provider());
    let mut meal = candidate(&["80 g oats", "1 medium banana (118 g)"], 0);

    aggregate(&mut meal, &mut resolver).await;
    let first = meal.macros();
    aggregate(&mut meal, &mut resolver).await;

    assert_eq!(meal.macros(), first);
    assert_eq!(first.calories, 416);
    assert_eq!(meal.contributions.len(), 2);
}
