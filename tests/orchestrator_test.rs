// ABOUTME: End-to-end tests for the generation orchestrator with scripted generators
// ABOUTME: Exercises acceptance, partial-output retries, calorie fallback, and tool-seeded facts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{init_test_logging, lookup_call, meals_document, stub_provider, ScriptedGenerator};
use mealforge::config::PipelineConfig;
use mealforge::constraints::{CalorieRuleInput, ConstraintTier};
use mealforge::llm::{GenerationResponse, GeneratorCapabilities, MessageRole};
use mealforge::models::MacroSource;
use mealforge::orchestrator::{GenerationOrchestrator, GenerationState, MealPlanRequest};
use serde_json::{json, Value};
use std::sync::Arc;

fn tier(value: Value) -> ConstraintTier {
    match value {
        Value::Object(map) => map,
        _ => ConstraintTier::new(),
    }
}

fn orchestrator(generator: Arc<ScriptedGenerator>) -> GenerationOrchestrator {
    GenerationOrchestrator::new(generator, stub_provider(), PipelineConfig::default())
}

fn tofu_dinner(name: &str, grams: u32) -> Value {
    tofu_meal("dinner", name, grams)
}

fn tofu_meal(meal_type: &str, name: &str, grams: u32) -> Value {
    json!({
        "mealType": meal_type,
        "name": name,
        "ingredients": [format!("{grams} g tofu")],
        "instructions": ["Press the tofu", "Sear until golden"],
        "calories": 250,
        "protein": 30,
        "carbs": 5,
        "fat": 15
    })
}

// ============================================================================
// Acceptance
// ============================================================================

#[tokio::test]
async fn test_vegan_plan_is_verified_and_filtered() {
    init_test_logging();
    let document = meals_document(&json!([
        {
            "mealType": "breakfast",
            "name": "Honey Oats",
            "ingredients": ["80 g oats", "20 g honey"],
            "calories": 380
        },
        {
            "mealType": "breakfast",
            "name": "Banana Oat Bowl",
            "ingredients": ["80 g oats", "1 medium banana (118 g)", "1 cup almond milk (240 g)"],
            "instructions": "1. Warm the milk 2. Stir in oats 3. Top with banana",
            "calories": 500
        },
        {
            "mealType": "dinner",
            "name": "Tofu Rice Bowl",
            "ingredients": ["200 g tofu", "150 g rice", "1 cup spinach (30 g)", "salt to taste"],
            "calories": 999
        }
    ]));
    let generator = Arc::new(ScriptedGenerator::text_only([document]));
    let request = MealPlanRequest {
        user: tier(json!({ "dietary_restrictions": "vegan" })),
        request: tier(json!({ "banned_ingredients": ["honey"], "num1": 1, "num2": 0, "num3": 1 })),
        ..MealPlanRequest::default()
    };

    let outcome = orchestrator(generator.clone()).plan(&request).await;

    assert_eq!(outcome.final_state, GenerationState::Accept);
    assert_eq!(outcome.attempts, 1);
    assert!(!outcome.fallback_used);
    assert_eq!(generator.call_count(), 1);

    let names: Vec<&str> = outcome.meals.iter().map(|meal| meal.name.as_str()).collect();
    assert_eq!(names, vec!["Banana Oat Bowl", "Tofu Rice Bowl"]);
    assert_eq!(outcome.meals[0].calories, 452);
    assert_eq!(outcome.meals[1].calories, 490);
    assert_eq!(outcome.meals[0].instructions.len(), 3);
    for meal in &outcome.meals {
        assert_eq!(meal.macro_source, MacroSource::LiveLookup);
        assert!(meal.id.is_some());
        assert!(meal.calorie_warning.is_none());
    }

    assert_eq!(outcome.rejections.len(), 1);
    assert_eq!(outcome.rejections[0].meal.name, "Honey Oats");
    assert!(outcome.prompt.contains("Dietary constraints: vegan"));
    assert!(outcome.prompt.contains("Flavor inspiration: Mediterranean"));
    assert!(outcome.prompt.contains("Generate 1 breakfast, 0 lunch, and 1 dinner recipes."));
}

#[tokio::test]
async fn test_generator_failure_yields_empty_plan() {
    init_test_logging();
    let generator = Arc::new(ScriptedGenerator::text_only(Vec::<String>::new()));

    let outcome = orchestrator(generator.clone())
        .plan(&MealPlanRequest::default())
        .await;

    assert!(outcome.meals.is_empty());
    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.final_state, GenerationState::Accept);
    assert_eq!(generator.call_count(), 2);
}

// ============================================================================
// Retry
// ============================================================================

#[tokio::test]
async fn test_partial_output_triggers_retry() {
    init_test_logging();
    let complete = tofu_dinner("First Tofu", 100).to_string();
    let truncated = format!(r#"{{"meals": [{complete}, {{"mealType": "dinner", "name": "Half"#);
    let valid = meals_document(&json!([tofu_dinner("Second Tofu", 150)]));
    let generator = Arc::new(ScriptedGenerator::text_only([truncated, valid]));

    let outcome = orchestrator(generator.clone())
        .plan(&MealPlanRequest::default())
        .await;

    assert_eq!(outcome.attempts, 2);
    assert_eq!(generator.call_count(), 2);
    assert_eq!(outcome.final_state, GenerationState::Accept);
    assert_eq!(outcome.meals.len(), 1);
    assert_eq!(outcome.meals[0].name, "Second Tofu");
    assert_eq!(outcome.meals[0].calories, 216);
}

// ============================================================================
// Fallback
// ============================================================================

#[tokio::test]
async fn test_calorie_violators_fill_empty_slots() {
    init_test_logging();
    let generator = Arc::new(ScriptedGenerator::text_only([
        meals_document(&json!([tofu_dinner("Big Tofu", 300)])),
        meals_document(&json!([tofu_dinner("Smaller Tofu", 250)])),
    ]));
    let request = MealPlanRequest {
        calorie_rules: vec![CalorieRuleInput::new("under", json!(300), "each meal")],
        ..MealPlanRequest::default()
    };

    let outcome = orchestrator(generator.clone()).plan(&request).await;

    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.final_state, GenerationState::Fallback);
    assert!(outcome.fallback_used);
    assert_eq!(outcome.rejections.len(), 2);
    assert_eq!(outcome.meals.len(), 1);
    assert_eq!(outcome.meals[0].name, "Smaller Tofu");
    assert_eq!(
        outcome.meals[0].calorie_warning.as_deref(),
        Some("360 kcal (goal under 300)")
    );
    assert_eq!(
        outcome.calorie_rule_summaries,
        vec!["Under 300 calories for each meal"]
    );
}

#[tokio::test]
async fn test_fallback_fill_respects_day_part_counts() {
    init_test_logging();
    let document = meals_document(&json!([
        tofu_meal("breakfast", "Light Tofu", 150),
        tofu_meal("breakfast", "Second Breakfast", 250),
        tofu_meal("dinner", "Tofu Dinner", 300),
    ]));
    let generator = Arc::new(ScriptedGenerator::text_only([document.clone(), document]));
    let request = MealPlanRequest {
        request: tier(json!({ "num1": 1, "num2": 0, "num3": 1 })),
        calorie_rules: vec![CalorieRuleInput::new("under", json!(300), "each meal")],
        ..MealPlanRequest::default()
    };

    let outcome = orchestrator(generator.clone()).plan(&request).await;

    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.final_state, GenerationState::Fallback);
    let slots: Vec<(&str, &str)> = outcome
        .meals
        .iter()
        .map(|meal| (meal.meal_type.as_str(), meal.name.as_str()))
        .collect();
    assert_eq!(
        slots,
        vec![("breakfast", "Light Tofu"), ("dinner", "Tofu Dinner")]
    );
    assert!(outcome.meals[0].calorie_warning.is_none());
    assert_eq!(
        outcome.meals[1].calorie_warning.as_deref(),
        Some("432 kcal (goal under 300)")
    );
}

// ============================================================================
// Tool-capable generators
// ============================================================================

#[tokio::test]
async fn test_tool_lookups_seed_aggregation() {
    init_test_logging();
    let document = meals_document(&json!([{
        "mealType": "dinner",
        "name": "Tofu and Rice",
        "ingredients": ["200 g tofu", "150 g rice"],
        "calories": 400
    }]));
    let generator = Arc::new(ScriptedGenerator::with_responses(
        GeneratorCapabilities::text_only() | GeneratorCapabilities::FUNCTION_CALLING,
        vec![
            Ok(lookup_call("c1", "tofu")),
            Ok(GenerationResponse::text(document)),
        ],
    ));

    let outcome = orchestrator(generator.clone())
        .plan(&MealPlanRequest::default())
        .await;

    assert_eq!(outcome.final_state, GenerationState::Accept);
    assert_eq!(outcome.meals.len(), 1);
    assert_eq!(outcome.meals[0].macro_source, MacroSource::CachedLookup);
    assert_eq!(outcome.meals[0].calories, 483);

    let requests = generator.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].tools.is_some());
    assert!(requests[1]
        .messages
        .iter()
        .any(|message| message.role == MessageRole::Tool));
}
