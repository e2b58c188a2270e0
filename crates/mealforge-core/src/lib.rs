// ABOUTME: Core types and constants for the mealforge meal plan pipeline
// ABOUTME: Foundation crate with error handling, unit constants, and domain models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Mealforge Core
//!
//! Foundation crate providing shared types and constants for the mealforge
//! pipeline. It carries no I/O and changes infrequently, so the root crate
//! benefits from incremental compilation.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `AppResult`
//! - **constants**: Unit conversions, nutrient identifiers, and request limits
//! - **models**: Meals, ingredients, nutrition facts, and constraint types

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (meals, ingredients, nutrition facts, constraints)
pub mod models;
