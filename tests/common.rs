// ABOUTME: Shared test utilities for mealforge integration tests
// ABOUTME: Provides a scripted generator, stub fact providers, and quiet tracing setup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `mealforge`

use async_trait::async_trait;
use mealforge::config::PipelineConfig;
use mealforge::errors::{AppError, AppResult};
use mealforge::llm::{
    GenerationRequest, GenerationResponse, GeneratorCapabilities, TextGenerator, ToolCall,
};
use mealforge::nutrition::{NutritionResolver, StubFactProvider};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Generator that replays queued responses and records every request
pub struct ScriptedGenerator {
    capabilities: GeneratorCapabilities,
    responses: Mutex<VecDeque<AppResult<GenerationResponse>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    /// Plain text generator replaying `texts` in order
    pub fn text_only<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_responses(
            GeneratorCapabilities::text_only(),
            texts
                .into_iter()
                .map(|text| Ok(GenerationResponse::text(text)))
                .collect(),
        )
    }

    /// Generator with explicit capabilities and scripted results
    pub fn with_responses(
        capabilities: GeneratorCapabilities,
        responses: Vec<AppResult<GenerationResponse>>,
    ) -> Self {
        Self {
            capabilities,
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received so far
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn capabilities(&self) -> GeneratorCapabilities {
        self.capabilities
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::internal("script exhausted")))
    }
}

/// Response requesting one `lookupIngredient` call
pub fn lookup_call(id: &str, ingredient: &str) -> GenerationResponse {
    GenerationResponse {
        tool_calls: vec![ToolCall {
            id: id.to_owned(),
            name: "lookupIngredient".to_owned(),
            arguments: serde_json::json!({ "ingredient": ingredient }).to_string(),
        }],
        ..GenerationResponse::default()
    }
}

/// Stub provider holding the standard food list
pub fn stub_provider() -> Arc<StubFactProvider> {
    Arc::new(StubFactProvider::with_standard_records())
}

/// Resolver over `provider` with default settings
pub fn resolver_for(provider: Arc<StubFactProvider>) -> NutritionResolver {
    let config = PipelineConfig::default();
    NutritionResolver::new(provider, config.resolver, config.timeouts.provider())
}

/// Serialize a meal list document as a generator would return it
pub fn meals_document(meals: &serde_json::Value) -> String {
    serde_json::json!({ "meals": meals }).to_string()
}
