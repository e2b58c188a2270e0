// ABOUTME: Prompts for meal plan generation; the system prompt is loaded at compile time
// ABOUTME: Re-exports the user prompt builder for constraint-aware generation requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Prompts
//!
//! The system prompt lives in a markdown file next to this module so it can
//! be edited without touching code.

mod meal_plan;

pub use meal_plan::{PromptBuilder, MEAL_SCHEMA};

/// System prompt for the recipe generator
pub const RECIPE_SYSTEM_PROMPT: &str = include_str!("recipe_system.md");

/// Prompt used to ask the generator to rewrite malformed output
pub const JSON_REPAIR_PREFIX: &str = "Fix to strictly valid JSON only (no commentary):\n";

/// Get the system prompt for meal generation
#[must_use]
pub const fn recipe_system_prompt() -> &'static str {
    RECIPE_SYSTEM_PROMPT
}
