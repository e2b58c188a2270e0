// ABOUTME: Chat completions generator for OpenAI-compatible endpoints, with tool calls and JSON mode
// ABOUTME: Used for meal plan generation, ingredient lookups, and the JSON repair pass
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI`-Compatible Generator
//!
//! Any server speaking the `/chat/completions` protocol works: hosted
//! `OpenAI`, Ollama, vLLM, `LocalAI`.
//!
//! ## Configuration
//!
//! - `LLM_BASE_URL`: Base URL (default: <https://api.openai.com/v1>)
//! - `LLM_MODEL`: Model to use (default: `gpt-4.1-mini`)
//! - `LLM_API_KEY`: Bearer token, omitted for local servers
//!
//! When tools are not offered and the endpoint supports JSON mode, requests
//! ask for a JSON object response. Decoding stays tolerant either way.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::{
    ChatMessage, GenerationRequest, GenerationResponse, GeneratorCapabilities, TextGenerator,
    TokenUsage, Tool, ToolCall,
};
use crate::constants::service_names;
use crate::errors::{AppError, AppResult, ErrorCode};

const BASE_URL_ENV: &str = "LLM_BASE_URL";
const MODEL_ENV: &str = "LLM_MODEL";
const API_KEY_ENV: &str = "LLM_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4.1-mini";

const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Characters of an unparsable body kept in error messages
const BODY_EXCERPT_CHARS: usize = 200;

// ============================================================================
// Wire Format
// ============================================================================

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content.clone(),
            tool_calls: message.tool_calls.iter().map(WireToolCall::from).collect(),
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunctionCall,
}

impl From<&ToolCall> for WireToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: function_kind(),
            function: WireFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        }
    }
}

impl From<WireToolCall> for ToolCall {
    fn from(call: WireToolCall) -> Self {
        Self {
            id: call.id,
            name: call.function.name,
            arguments: call.function.arguments,
        }
    }
}

fn function_kind() -> String {
    "function".to_owned()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct CompletionReply {
    #[serde(default)]
    choices: Vec<ReplyChoice>,
    #[serde(default)]
    usage: Option<ReplyUsage>,
    #[serde(default)]
    model: String,
}

#[derive(Debug, Deserialize)]
struct ReplyChoice {
    message: ReplyMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct ReplyUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// ============================================================================
// Configuration
// ============================================================================

/// Endpoint settings for [`OpenAiCompatibleGenerator`]
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// Base URL, without the `/chat/completions` suffix
    pub base_url: String,
    /// Bearer token; `None` for unauthenticated local servers
    pub api_key: Option<String>,
    /// Model used when a request names none
    pub model: String,
    /// What the endpoint supports
    pub capabilities: GeneratorCapabilities,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiCompatibleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            capabilities: GeneratorCapabilities::all(),
            timeout_secs: 120,
        }
    }
}

impl OpenAiCompatibleConfig {
    /// Read `LLM_BASE_URL`, `LLM_MODEL`, and `LLM_API_KEY`
    #[must_use]
    pub fn from_env(timeout_secs: u64) -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|value| !value.trim().is_empty());
        Self {
            base_url: non_empty(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            api_key: non_empty(API_KEY_ENV),
            model: non_empty(MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            timeout_secs,
            ..Self::default()
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

// ============================================================================
// Generator
// ============================================================================

/// Generator speaking the `OpenAI` chat completions protocol
pub struct OpenAiCompatibleGenerator {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleGenerator {
    /// Create a generator for `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: OpenAiCompatibleConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        info!(base_url = %config.base_url, model = %config.model, "Text generator ready");
        Ok(Self { client, config })
    }

    /// Create a generator from `LLM_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_env(timeout_secs: u64) -> AppResult<Self> {
        Self::new(OpenAiCompatibleConfig::from_env(timeout_secs))
    }

    fn wire_tools(tools: &[Tool]) -> Vec<WireTool> {
        tools
            .iter()
            .flat_map(|tool| &tool.function_declarations)
            .map(|declaration| WireTool {
                kind: "function",
                function: WireFunction {
                    name: declaration.name.clone(),
                    description: declaration.description.clone(),
                    parameters: declaration.parameters.clone(),
                },
            })
            .collect()
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest) -> CompletionBody<'a> {
        let capabilities = self.config.capabilities;
        let tools = match &request.tools {
            Some(tools) if capabilities.supports_function_calling() => Self::wire_tools(tools),
            _ => Vec::new(),
        };
        let json_mode = tools.is_empty() && capabilities.supports_json_mode();

        CompletionBody {
            model: request.model.as_deref().unwrap_or(&self.config.model),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tool_choice: (!tools.is_empty()).then_some("auto"),
            tools,
            response_format: json_mode.then(|| json!({ "type": "json_object" })),
        }
    }

    /// Map a non-success status to an error code the pipeline can log
    fn status_error(status: StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
            |_| body.chars().take(BODY_EXCERPT_CHARS).collect::<String>(),
            |envelope| envelope.error.message,
        );
        let code = match status.as_u16() {
            401 | 403 => ErrorCode::ExternalAuthFailed,
            429 => ErrorCode::ExternalRateLimited,
            502..=504 => ErrorCode::ExternalServiceUnavailable,
            _ => ErrorCode::ExternalServiceError,
        };
        AppError::new(code, format!("{}: HTTP {status}: {detail}", service_names::LLM))
    }

    fn into_response(reply: CompletionReply) -> AppResult<GenerationResponse> {
        let choice = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service(service_names::LLM, "reply had no choices"))?;

        Ok(GenerationResponse {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.into_iter().map(ToolCall::from).collect(),
            model: reply.model,
            usage: reply.usage.map(|usage| TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiCompatibleGenerator {
    fn name(&self) -> &'static str {
        "openai_compatible"
    }

    fn capabilities(&self) -> GeneratorCapabilities {
        self.config.capabilities
    }

    #[instrument(skip_all, fields(messages = request.messages.len()))]
    async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        let body = self.body(request);
        debug!(
            model = body.model,
            tools = body.tools.len(),
            json_mode = body.response_format.is_some(),
            "Sending chat completion"
        );

        let mut http = self.client.post(self.config.completions_url()).json(&body);
        if let Some(key) = &self.config.api_key {
            http = http.bearer_auth(key);
        }

        let response = http.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::timeout(service_names::LLM, self.config.timeout_secs)
            } else {
                AppError::external_service(service_names::LLM, format!("request failed: {e}"))
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            AppError::external_service(service_names::LLM, format!("unreadable reply: {e}"))
        })?;
        if !status.is_success() {
            let error = Self::status_error(status, &text);
            warn!(%status, code = ?error.code, "Chat completion rejected");
            return Err(error);
        }

        let reply: CompletionReply = serde_json::from_str(&text).map_err(|e| {
            AppError::external_service(service_names::LLM, format!("malformed reply: {e}"))
        })?;
        let response = Self::into_response(reply)?;

        debug!(
            chars = response.content_text().len(),
            tool_calls = response.tool_calls.len(),
            finish_reason = ?response.finish_reason,
            "Chat completion received"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{lookup_ingredient_tool, ChatMessage};

    fn generator(capabilities: GeneratorCapabilities) -> OpenAiCompatibleGenerator {
        OpenAiCompatibleGenerator {
            client: Client::new(),
            config: OpenAiCompatibleConfig {
                capabilities,
                ..OpenAiCompatibleConfig::default()
            },
        }
    }

    #[test]
    fn test_tool_turns_serialize_call_ids() {
        let call = ToolCall {
            id: "call_1".to_owned(),
            name: "lookupIngredient".to_owned(),
            arguments: r#"{"ingredient":"oats"}"#.to_owned(),
        };
        let assistant = serde_json::to_value(WireMessage::from(
            &ChatMessage::assistant_tool_calls("", vec![call]),
        ))
        .unwrap_or_default();
        let tool_turn = ChatMessage::tool_result("call_1", "{}");
        let tool = serde_json::to_value(WireMessage::from(&tool_turn)).unwrap_or_default();

        assert_eq!(assistant["tool_calls"][0]["type"], "function");
        assert_eq!(assistant["tool_calls"][0]["function"]["name"], "lookupIngredient");
        assert_eq!(tool["role"], "tool");
        assert_eq!(tool["tool_call_id"], "call_1");
    }

    #[test]
    fn test_json_mode_only_without_tools() {
        let generator = generator(GeneratorCapabilities::all());
        let plain = GenerationRequest::new(vec![ChatMessage::user("plan")]);
        let with_tools = plain.clone().with_tools(vec![lookup_ingredient_tool()]);

        let body = serde_json::to_value(generator.body(&plain)).unwrap_or_default();
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body.get("tools").is_none());

        let body = serde_json::to_value(generator.body(&with_tools)).unwrap_or_default();
        assert!(body.get("response_format").is_none());
        assert_eq!(body["tools"][0]["function"]["name"], "lookupIngredient");
        assert_eq!(body["tool_choice"], "auto");
    }

    #[test]
    fn test_tools_dropped_when_unsupported() {
        let generator = generator(GeneratorCapabilities::text_only());
        let request = GenerationRequest::new(vec![ChatMessage::user("plan")])
            .with_tools(vec![lookup_ingredient_tool()]);
        let body = serde_json::to_value(generator.body(&request)).unwrap_or_default();
        assert!(body.get("tools").is_none());
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_status_errors_map_to_codes() {
        let limited = OpenAiCompatibleGenerator::status_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": {"message": "slow down"}}"#,
        );
        assert_eq!(limited.code, ErrorCode::ExternalRateLimited);
        assert!(limited.message.ends_with("slow down"));

        let gateway = OpenAiCompatibleGenerator::status_error(
            StatusCode::BAD_GATEWAY,
            "<html>bad gateway</html>",
        );
        assert_eq!(gateway.code, ErrorCode::ExternalServiceUnavailable);
    }

    #[test]
    fn test_reply_without_choices_is_an_error() {
        let reply = CompletionReply {
            choices: Vec::new(),
            usage: None,
            model: "gpt-4.1-mini".to_owned(),
        };
        assert!(OpenAiCompatibleGenerator::into_response(reply).is_err());
    }
}
