// ABOUTME: Integration tests for the bounded ingredient lookup tool loop
// ABOUTME: Covers round limits, tool error payloads, memoization, and the kept fact cache
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use async_trait::async_trait;
use common::{init_test_logging, lookup_call, resolver_for, stub_provider, ScriptedGenerator};
use mealforge::errors::{AppError, AppResult};
use mealforge::llm::{
    run_with_tools, ChatMessage, GenerationResponse, GeneratorCapabilities, IngredientLookupTool,
    MessageRole, ToolCall, ToolExecutor, ToolLoopSettings, LOOKUP_INGREDIENT_TOOL,
};
use serde_json::{json, Value};

const SETTINGS: ToolLoopSettings = ToolLoopSettings {
    max_rounds: 2,
    temperature: 0.6,
    max_tokens: 512,
};

fn tool_generator(responses: Vec<GenerationResponse>) -> ScriptedGenerator {
    ScriptedGenerator::with_responses(
        GeneratorCapabilities::text_only() | GeneratorCapabilities::FUNCTION_CALLING,
        responses.into_iter().map(Ok).collect(),
    )
}

fn tool_payload(message: &ChatMessage) -> Value {
    assert_eq!(message.role, MessageRole::Tool);
    serde_json::from_str(&message.content).unwrap()
}

// ============================================================================
// Loop control
// ============================================================================

#[tokio::test]
async fn test_lookup_then_answer() {
    init_test_logging();
    let generator = tool_generator(vec![
        lookup_call("call-1", "tofu"),
        GenerationResponse::text(r#"{"meals": []}"#),
    ]);
    let tool = IngredientLookupTool::new(resolver_for(stub_provider()));

    let text = run_with_tools(&generator, &tool, vec![ChatMessage::user("plan")], SETTINGS)
        .await
        .unwrap();

    assert_eq!(text, r#"{"meals": []}"#);
    let requests = generator.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].tools.is_some());

    let followup = &requests[1].messages;
    assert_eq!(followup.len(), 3);
    assert_eq!(followup[1].role, MessageRole::Assistant);
    assert_eq!(followup[1].tool_calls.len(), 1);
    assert_eq!(followup[2].tool_call_id.as_deref(), Some("call-1"));
    let payload = tool_payload(&followup[2]);
    assert_eq!(payload["ok"], json!(true));
    assert_eq!(payload["fact"]["source_id"], json!("fdc:172475"));
    assert_eq!(payload["fact"]["calories"], json!(144.0));

    let cached: Vec<String> = tool.fact_cache().into_iter().map(|(key, _)| key).collect();
    assert!(cached.contains(&"tofu".to_owned()));
}

#[tokio::test]
async fn test_round_limit_withdraws_tools() {
    init_test_logging();
    let generator = tool_generator(vec![
        lookup_call("a", "rice"),
        lookup_call("b", "oats"),
        lookup_call("c", "quinoa"),
    ]);
    let tool = IngredientLookupTool::new(resolver_for(stub_provider()));

    let text = run_with_tools(&generator, &tool, vec![ChatMessage::user("plan")], SETTINGS)
        .await
        .unwrap();

    assert!(text.is_empty());
    let requests = generator.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[0].tools.is_some());
    assert!(requests[1].tools.is_some());
    assert!(requests[2].tools.is_none());
    assert_eq!(requests[2].temperature, Some(0.6));
    assert_eq!(requests[2].max_tokens, Some(512));
}

#[tokio::test]
async fn test_generator_error_propagates() {
    init_test_logging();
    let generator = ScriptedGenerator::with_responses(
        GeneratorCapabilities::FUNCTION_CALLING,
        vec![Err(AppError::external_service("scripted", "overloaded"))],
    );
    let tool = IngredientLookupTool::new(resolver_for(stub_provider()));

    let result =
        run_with_tools(&generator, &tool, vec![ChatMessage::user("plan")], SETTINGS).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_invalid_arguments_become_error_payload() {
    init_test_logging();
    let broken = GenerationResponse {
        tool_calls: vec![ToolCall {
            id: "x".to_owned(),
            name: LOOKUP_INGREDIENT_TOOL.to_owned(),
            arguments: "{not json".to_owned(),
        }],
        ..GenerationResponse::default()
    };
    let generator = tool_generator(vec![broken, GenerationResponse::text("done")]);
    let tool = IngredientLookupTool::new(resolver_for(stub_provider()));

    run_with_tools(&generator, &tool, vec![ChatMessage::user("plan")], SETTINGS)
        .await
        .unwrap();

    let requests = generator.requests();
    let payload = tool_payload(requests[1].messages.last().unwrap());
    assert_eq!(payload, json!({"ok": false, "error": "ingredient_required"}));
}

// ============================================================================
// Tool executor
// ============================================================================

#[tokio::test]
async fn test_lookup_error_payloads() {
    init_test_logging();
    let tool = IngredientLookupTool::new(resolver_for(stub_provider()));

    let unsupported = tool.execute("fetchWeather", &json!({})).await.unwrap();
    assert_eq!(unsupported["error"], json!("unsupported_tool:fetchWeather"));

    let missing = tool
        .execute(LOOKUP_INGREDIENT_TOOL, &json!({"ingredient": "  "}))
        .await
        .unwrap();
    assert_eq!(missing["error"], json!("ingredient_required"));

    let not_found = tool
        .execute(LOOKUP_INGREDIENT_TOOL, &json!({"ingredient": "moon cheese"}))
        .await
        .unwrap();
    assert_eq!(not_found["ok"], json!(false));
    assert_eq!(not_found["error"], json!("not_found"));
    assert!(not_found["warnings"][0]
        .as_str()
        .unwrap()
        .contains("moon cheese"));
}

#[tokio::test]
async fn test_lookups_are_memoized_case_insensitively() {
    init_test_logging();
    let provider = stub_provider();
    let tool = IngredientLookupTool::new(resolver_for(provider.clone()));

    let first = tool
        .execute(LOOKUP_INGREDIENT_TOOL, &json!({"ingredient": "Black Beans"}))
        .await
        .unwrap();
    let second = tool
        .execute(LOOKUP_INGREDIENT_TOOL, &json!({"ingredient": "black beans"}))
        .await
        .unwrap();

    assert_eq!(first["fact"], second["fact"]);
    assert_eq!(provider.search_count(), 1);
    assert!((first["fact"]["serving_size_oz"].as_f64().unwrap() - 3.5274).abs() < 1e-4);
}

struct BrokenExecutor;

#[async_trait]
impl ToolExecutor for BrokenExecutor {
    async fn execute(&self, _: &str, _: &Value) -> AppResult<Value> {
        Err(AppError::internal("executor crashed"))
    }
}

#[tokio::test]
async fn test_executor_failure_is_reported_to_generator() {
    init_test_logging();
    let generator = tool_generator(vec![
        lookup_call("z", "tofu"),
        GenerationResponse::text("final"),
    ]);

    let text = run_with_tools(
        &generator,
        &BrokenExecutor,
        vec![ChatMessage::user("plan")],
        SETTINGS,
    )
    .await
    .unwrap();

    assert_eq!(text, "final");
    let requests = generator.requests();
    let payload = tool_payload(requests[1].messages.last().unwrap());
    assert_eq!(payload["error"], json!("tool_execution_failed"));
}
