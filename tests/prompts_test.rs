// ABOUTME: Integration tests for generation prompt assembly and variety focus selection
// ABOUTME: Checks counts, diet and ban lines, calorie goals, fact grounding, and preamble
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{init_test_logging, resolver_for, stub_provider};
use mealforge::constraints::{merge, ConstraintTier};
use mealforge::llm::{recipe_system_prompt, PromptBuilder, MEAL_SCHEMA};
use mealforge::models::RetrievalBatch;
use mealforge::variety::plan_variety;
use serde_json::{json, Value};

fn tier(value: Value) -> ConstraintTier {
    match value {
        Value::Object(map) => map,
        _ => ConstraintTier::new(),
    }
}

#[test]
fn test_minimal_prompt_has_schema_and_counts() {
    let constraints = merge(
        &ConstraintTier::new(),
        &ConstraintTier::new(),
        &ConstraintTier::new(),
    );
    let prompt = PromptBuilder::new(&constraints).build();

    assert!(prompt.contains(MEAL_SCHEMA));
    assert!(prompt.contains("Generate 0 breakfast, 0 lunch, and 1 dinner recipes."));
    assert!(prompt.contains("7. No specific dietary constraints."));
    assert!(!prompt.contains("Calorie goals:"));
    assert!(!prompt.contains("Variety:"));
    assert!(prompt.ends_with("JSON only, no extra text."));
}

#[test]
fn test_constraint_lines() {
    let constraints = merge(
        &ConstraintTier::new(),
        &tier(json!({
            "dietary_restrictions": "dairy-free",
            "disliked_ingredients": ["olives"]
        })),
        &tier(json!({ "num1": 2, "num2": 1, "num3": 0, "calories": 550 })),
    );
    let prompt = PromptBuilder::new(&constraints)
        .with_rule_summaries(vec!["About 550 calories for each meal".to_owned()])
        .with_preamble(Some("  Athlete in a cutting phase.  ".to_owned()))
        .build();

    assert!(prompt.starts_with("Athlete in a cutting phase.\n\n"));
    assert!(prompt.contains("Generate 2 breakfast, 1 lunch, and 0 dinner recipes."));
    assert!(prompt.contains("Dietary constraints: dairy-free"));
    assert!(prompt.contains("Per meal target ~550 calories (±10%)"));
    assert!(prompt.contains("Never use these ingredients: butter, casein, cheese"));
    assert!(prompt.contains("Avoid these disliked ingredients when possible: olives"));
    assert!(prompt.contains("Calorie goals:\n- About 550 calories for each meal"));
}

#[test]
fn test_blank_variety_and_preamble_are_dropped() {
    let constraints = merge(
        &ConstraintTier::new(),
        &ConstraintTier::new(),
        &ConstraintTier::new(),
    );
    let prompt = PromptBuilder::new(&constraints)
        .with_variety_context(Some("   ".to_owned()))
        .with_preamble(Some(String::new()))
        .with_facts(Some(&RetrievalBatch::default()))
        .build();

    assert!(!prompt.contains("Variety:"));
    assert!(!prompt.contains(RetrievalBatch::DEFAULT_HEADING));
    assert!(prompt.starts_with("You are a recipe generator"));
}

#[tokio::test]
async fn test_favorites_ground_the_prompt_with_facts() {
    init_test_logging();
    let constraints = merge(
        &ConstraintTier::new(),
        &ConstraintTier::new(),
        &tier(json!({ "favorites": ["Quinoa", "broccoli", "quinoa"], "num1": 1 })),
    );
    let mut resolver = resolver_for(stub_provider());

    let (focus, batch) = plan_variety(&mut resolver, &constraints, 4).await;
    let batch = batch.unwrap();

    assert!(focus.uses_favorites);
    assert_eq!(focus.terms, vec!["quinoa", "broccoli"]);
    assert_eq!(batch.facts.len(), 2);

    let prompt = PromptBuilder::new(&constraints)
        .with_variety_context(focus.context(constraints.has_distinct_day_parts()))
        .with_facts(Some(&batch))
        .build();

    assert!(prompt.contains("Variety: User favorites to incorporate: quinoa, broccoli. Make breakfast"));
    assert!(prompt.contains("Supporting ingredient facts:\n- quinoa, cooked"));
    assert!(prompt.contains("[120 kcal; P 4.4 g; C 21.3 g; F 1.9 g; serving=100 g]"));
}

#[tokio::test]
async fn test_unmatched_favorites_fall_back_to_preset() {
    init_test_logging();
    let constraints = merge(
        &ConstraintTier::new(),
        &ConstraintTier::new(),
        &tier(json!({ "favorites": "durian", "num2": 1, "num3": 0 })),
    );
    let mut resolver = resolver_for(stub_provider());

    let (focus, _) = plan_variety(&mut resolver, &constraints, 4).await;

    assert!(!focus.uses_favorites);
    assert_eq!(focus.manual_terms, vec!["durian"]);
    let context = focus.context(false).unwrap();
    assert!(context.starts_with("User flavor cue: durian. Flavor inspiration: East Asian"));
}

#[test]
fn test_system_prompt_demands_json_with_gram_weights() {
    let system = recipe_system_prompt();
    assert!(system.contains("ONLY valid JSON"));
    assert!(system.contains("weight in grams"));
    assert!(system.contains("lookupIngredient"));
}
