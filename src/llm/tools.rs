// ABOUTME: Ingredient lookup tool exposed to tool-capable generators and the bounded tool loop
// ABOUTME: Memoizes results per term and keeps looked-up facts for later macro aggregation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Tool Calling
//!
//! The generator may call `lookupIngredient` while composing a meal plan.
//! [`run_with_tools`] drives the exchange: generate, execute requested
//! calls, append the assistant and tool messages, and re-invoke, for at most
//! `max_rounds` rounds. The final request is sent without tools so the
//! generator has to answer with text.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{ChatMessage, FunctionDeclaration, GenerationRequest, TextGenerator, Tool};
use crate::constants::units::GRAMS_PER_OUNCE;
use crate::errors::AppResult;
use crate::ingredients::normalize_term;
use crate::models::{NutritionFact, RetrievalBatch};
use crate::nutrition::NutritionResolver;

/// Name of the ingredient lookup function
pub const LOOKUP_INGREDIENT_TOOL: &str = "lookupIngredient";

/// Declaration of the ingredient lookup function
#[must_use]
pub fn lookup_ingredient_tool() -> Tool {
    Tool {
        function_declarations: vec![FunctionDeclaration {
            name: LOOKUP_INGREDIENT_TOOL.to_owned(),
            description: "Fetch USDA-backed nutrition facts for a single ingredient term."
                .to_owned(),
            parameters: Some(json!({
                "type": "object",
                "properties": {
                    "ingredient": {
                        "type": "string",
                        "description": "Plain ingredient term to look up (e.g., 'salmon fillet')."
                    }
                },
                "required": ["ingredient"],
                "additionalProperties": false
            })),
        }],
    }
}

/// Executes a tool call requested by the generator
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run one call and return its JSON payload
    ///
    /// Expected failures (unknown tool, missing argument, no match) are
    /// reported inside the payload; `Err` means the executor itself broke.
    ///
    /// # Errors
    ///
    /// Returns an error when the call cannot be executed at all.
    async fn execute(&self, name: &str, args: &Value) -> AppResult<Value>;
}

/// `lookupIngredient` backed by a nutrition resolver
pub struct IngredientLookupTool {
    resolver: Mutex<NutritionResolver>,
    results: DashMap<String, Value>,
    facts: DashMap<String, NutritionFact>,
}

impl IngredientLookupTool {
    /// Wrap a resolver
    #[must_use]
    pub fn new(resolver: NutritionResolver) -> Self {
        Self {
            resolver: Mutex::new(resolver),
            results: DashMap::new(),
            facts: DashMap::new(),
        }
    }

    /// Facts returned to the generator, keyed by lowercase and normalized term
    #[must_use]
    pub fn fact_cache(&self) -> Vec<(String, NutritionFact)> {
        self.facts
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    fn fact_payload(fact: &NutritionFact) -> Value {
        let serving_size_oz = (fact.serving_size_g / GRAMS_PER_OUNCE * 10_000.0).round() / 10_000.0;
        json!({
            "canonical_name": fact.canonical_name,
            "source_id": fact.source_id,
            "summary": fact.summary,
            "serving_size_g": fact.serving_size_g,
            "serving_size_oz": serving_size_oz,
            "calories": fact.calories,
            "protein_g": fact.protein_g,
            "carbs_g": fact.carbs_g,
            "fats_g": fact.fats_g,
            "tags": fact.tags,
        })
    }

    async fn lookup(&self, term: &str) -> Value {
        let outcome = self.resolver.lock().await.try_resolve_with_origin(term).await;
        match outcome {
            Err(error) => {
                warn!(ingredient = %term, error = %error, "lookupIngredient failed");
                json!({"ok": false, "ingredient": term, "error": "lookup_failed"})
            }
            Ok(None) => {
                let missing = [term.to_owned()];
                let batch = RetrievalBatch::from_results(missing.to_vec(), Vec::new(), &missing);
                json!({
                    "ok": false,
                    "ingredient": term,
                    "error": "not_found",
                    "warnings": batch.warnings,
                })
            }
            Ok(Some(resolution)) => {
                let key = term.to_lowercase();
                let normalized = normalize_term(term);
                if !normalized.is_empty() {
                    self.facts
                        .entry(normalized)
                        .or_insert_with(|| resolution.fact.clone());
                }
                let payload = Self::fact_payload(&resolution.fact);
                self.facts.insert(key, resolution.fact);
                json!({"ok": true, "ingredient": term, "fact": payload})
            }
        }
    }
}

#[async_trait]
impl ToolExecutor for IngredientLookupTool {
    async fn execute(&self, name: &str, args: &Value) -> AppResult<Value> {
        if name != LOOKUP_INGREDIENT_TOOL {
            return Ok(json!({"ok": false, "error": format!("unsupported_tool:{name}")}));
        }

        let term = match args.get("ingredient") {
            Some(Value::String(text)) => text.trim().to_owned(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        if term.is_empty() {
            return Ok(json!({"ok": false, "error": "ingredient_required"}));
        }

        let key = term.to_lowercase();
        if let Some(memo) = self.results.get(&key) {
            return Ok(memo.value().clone());
        }

        let result = self.lookup(&term).await;
        self.results.insert(key, result.clone());
        Ok(result)
    }
}

/// Sampling settings for a tool-enabled exchange
#[derive(Debug, Clone, Copy)]
pub struct ToolLoopSettings {
    /// Rounds of tool execution before tools are withdrawn
    pub max_rounds: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token limit
    pub max_tokens: u32,
}

/// Drive a bounded generate/execute loop and return the final text
///
/// # Errors
///
/// Returns an error when a generator call fails.
pub async fn run_with_tools(
    generator: &dyn TextGenerator,
    executor: &dyn ToolExecutor,
    messages: Vec<ChatMessage>,
    settings: ToolLoopSettings,
) -> AppResult<String> {
    let tools = vec![lookup_ingredient_tool()];
    let mut messages = messages;

    for round in 0..=settings.max_rounds {
        let mut request = GenerationRequest::new(messages.clone())
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens);
        let offer_tools = round < settings.max_rounds;
        if offer_tools {
            request = request.with_tools(tools.clone());
        }

        let response = generator.generate(&request).await?;
        if !response.has_tool_calls() || !offer_tools {
            if response.has_tool_calls() {
                warn!(round, "Tool round limit reached; using the last text");
            }
            return Ok(response.content.unwrap_or_default());
        }

        debug!(round, calls = response.tool_calls.len(), "Executing tool calls");
        messages.push(ChatMessage::assistant_tool_calls(
            response.content_text(),
            response.tool_calls.clone(),
        ));
        for call in &response.tool_calls {
            let raw_args = if call.arguments.trim().is_empty() {
                "{}"
            } else {
                call.arguments.as_str()
            };
            let args: Value = serde_json::from_str(raw_args).unwrap_or_else(|_| {
                warn!(tool = %call.name, args = %raw_args, "Tool received invalid args JSON");
                json!({})
            });
            let result = match executor.execute(&call.name, &args).await {
                Ok(result) => result,
                Err(error) => {
                    warn!(tool = %call.name, error = %error, "Tool execution failed");
                    json!({"ok": false, "error": "tool_execution_failed"})
                }
            };
            messages.push(ChatMessage::tool_result(&call.id, result.to_string()));
        }
    }

    Ok(String::new())
}
