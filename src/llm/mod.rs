// ABOUTME: Text generator abstraction used by the meal plan pipeline
// ABOUTME: Defines messages, requests, tool declarations, and the async generator trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Text Generator Interface
//!
//! The pipeline talks to a generative model only through [`TextGenerator`].
//! Output is treated as untrusted text; decoding and validation happen
//! downstream.
//!
//! ## Key Concepts
//!
//! - **`GeneratorCapabilities`**: Bitflags describing generator features (tool calling, JSON mode)
//! - **`TextGenerator`**: Async trait for one request/response exchange
//! - **`ChatMessage`**: Role-based message, including assistant tool calls and tool results
//! - **`GenerationRequest`**: Messages plus temperature, token limit, and optional tools
//!
//! ## Example: Using a Generator
//!
//! ```rust,no_run
//! use mealforge::llm::{ChatMessage, GenerationRequest, TextGenerator};
//!
//! async fn example(generator: &dyn TextGenerator) {
//!     let request = GenerationRequest::new(vec![
//!         ChatMessage::system("Respond with JSON only."),
//!         ChatMessage::user("Two vegan breakfasts"),
//!     ])
//!     .with_temperature(0.6);
//!     let response = generator.generate(&request).await;
//! }
//! ```

mod openai_compatible;
pub mod prompts;
pub mod tools;

pub use openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleGenerator};
pub use prompts::{recipe_system_prompt, PromptBuilder, JSON_REPAIR_PREFIX, MEAL_SCHEMA};
pub use tools::{
    lookup_ingredient_tool, run_with_tools, IngredientLookupTool, ToolExecutor, ToolLoopSettings,
    LOOKUP_INGREDIENT_TOOL,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

// ============================================================================
// Capability Flags
// ============================================================================

bitflags::bitflags! {
    /// Generator capability flags
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct GeneratorCapabilities: u8 {
        /// Generator supports function/tool calling
        const FUNCTION_CALLING = 0b0000_0001;
        /// Generator supports JSON mode output
        const JSON_MODE = 0b0000_0010;
        /// Generator supports system messages
        const SYSTEM_MESSAGES = 0b0000_0100;
    }
}

impl GeneratorCapabilities {
    /// Capabilities of a plain text generator
    #[must_use]
    pub const fn text_only() -> Self {
        Self::SYSTEM_MESSAGES
    }

    /// Check if function calling is supported
    #[must_use]
    pub const fn supports_function_calling(&self) -> bool {
        self.contains(Self::FUNCTION_CALLING)
    }

    /// Check if JSON mode is supported
    #[must_use]
    pub const fn supports_json_mode(&self) -> bool {
        self.contains(Self::JSON_MODE)
    }
}

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
    /// Result of a tool call
    Tool,
}

impl MessageRole {
    /// Convert to string representation for API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// A tool invocation requested by the generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier echoed back in the tool result
    pub id: String,
    /// Function name
    pub name: String,
    /// Raw JSON arguments as sent by the generator
    pub arguments: String,
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
    /// Tool calls made by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Call this tool message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Create a new message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Assistant turn that requested tool calls
    #[must_use]
    pub fn assistant_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::assistant(content)
        }
    }

    /// Tool result answering `tool_call_id`
    #[must_use]
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(MessageRole::Tool, content)
        }
    }
}

// ============================================================================
// Tool Declarations
// ============================================================================

/// Function declaration offered to the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    /// Name of the function
    pub name: String,
    /// Description of what the function does
    pub description: String,
    /// Parameters schema (JSON Schema format)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// Group of function declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Function declarations for this tool
    pub function_declarations: Vec<FunctionDeclaration>,
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Configuration for one generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Model identifier (generator-specific)
    pub model: Option<String>,
    /// Temperature for response randomness (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Tools the generator may call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

impl GenerationRequest {
    /// Create a new request with messages
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
            tools: None,
        }
    }

    /// Set the temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Offer tools to the generator
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of tokens in the prompt
    pub prompt_tokens: u32,
    /// Number of tokens in the completion
    pub completion_tokens: u32,
    /// Total tokens used
    pub total_tokens: u32,
}

/// Response from one generation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated text (None when only tool calls were returned)
    pub content: Option<String>,
    /// Tool calls requested by the generator
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
    /// Model used for generation
    pub model: String,
    /// Token usage statistics
    pub usage: Option<TokenUsage>,
    /// Finish reason (stop, length, tool_calls, ...)
    pub finish_reason: Option<String>,
}

impl GenerationResponse {
    /// Plain text response
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Check if this response requests tool calls
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Text content, empty when absent
    #[must_use]
    pub fn content_text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

// ============================================================================
// Generator Trait
// ============================================================================

/// Text generator used for meal plan generation and JSON repair
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Unique generator identifier
    fn name(&self) -> &'static str;

    /// Generator capabilities
    fn capabilities(&self) -> GeneratorCapabilities;

    /// Perform one generation request
    ///
    /// # Errors
    ///
    /// Returns an error when the generator cannot be reached or answers with
    /// an unusable payload.
    async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse>;
}
