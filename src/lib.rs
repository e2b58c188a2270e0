// ABOUTME: Main library entry point for the mealforge meal plan pipeline
// ABOUTME: Turns untrusted generator output into verified, constraint-checked meal plans
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

// Crate-level attributes:
// - deny(unsafe_code): Zero-tolerance unsafe policy
#![deny(unsafe_code)]

//! # mealforge
//!
//! A meal plan generation pipeline that treats a generative model as an
//! untrusted text source. Requests flow through:
//!
//! - **Constraints**: three-tier preference merge, diet bans, calorie goals
//! - **Generation**: prompt building and an optional ingredient lookup tool loop
//! - **Decoding**: tolerant recovery of meal objects from malformed or truncated text
//! - **Normalization**: quantities, units, and gram/ounce weights for every ingredient
//! - **Nutrition**: fact resolution against a food database and macro recomputation
//! - **Enforcement**: banned ingredients, calorie rules, and per-day-part counts
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use mealforge::ingredients::normalize_text;
//!
//! let entry = normalize_text("1 1/2 cups rolled oats (120 g)");
//! assert_eq!(entry.weight_g, Some(120.0));
//! ```

// ── Public API ──────────────────────────────────────────────────────────

/// Pipeline configuration with environment overrides
pub mod config;

/// Structured logging setup and pipeline log events
pub mod logging;

/// Ingredient, instruction, and lookup-term normalization
pub mod ingredients;

/// Constraint merging, diet tables, calorie rules, and profile access
pub mod constraints;

/// Nutrition fact providers and the per-run resolver
pub mod nutrition;

/// Text generator abstraction, prompts, and the tool loop
pub mod llm;

/// Tolerant decoding of generator output
pub mod decoder;

/// Macro recomputation from resolved facts
pub mod aggregator;

/// Hard-constraint filtering and per-day-part truncation
pub mod enforcer;

/// Favorite and cuisine-preset focus for prompts
pub mod variety;

/// Request state machine tying the pipeline together
pub mod orchestrator;

// Re-export core types so `crate::errors` etc. resolve throughout the crate
pub use mealforge_core::{constants, errors, models};
