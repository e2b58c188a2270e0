// ABOUTME: Ingredient processing module: entry normalization, instruction cleanup, lookup terms
// ABOUTME: Converts heterogeneous generator notation into canonical ingredient values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Ingredient Processing
//!
//! - **normalizer**: quantity, unit, and weight extraction from ingredient entries
//! - **instructions**: step splitting and numbering cleanup
//! - **terms**: lookup terms used by the nutrition resolver
//! - **meal**: decoded meal objects to typed candidates

/// Ingredient entry normalization
pub mod normalizer;

/// Instruction step normalization
pub mod instructions;

/// Lookup-term normalization
pub mod terms;

/// Decoded meal object to typed candidate
pub mod meal;

pub use instructions::normalize_instructions;
pub use meal::{build_candidate, coerce_macro};
pub use normalizer::{format_fraction, normalize, normalize_all, normalize_text, parse_quantity};
pub use terms::{is_condiment, normalize_term, sorted_token_key, term_tokens};
