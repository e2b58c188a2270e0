// ABOUTME: Configuration management module for pipeline tuning and collaborator settings
// ABOUTME: Re-exports the pipeline configuration and its error type
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//! Configuration module for mealforge
//!
//! - **Pipeline**: calorie tolerance, fact matching thresholds, retry bounds, timeouts
//!
//! Collaborator settings (LLM endpoint, USDA API key) live next to their
//! clients and follow the same `from_env` pattern.

/// Pipeline tuning configuration
pub mod pipeline;

pub use pipeline::{
    CalorieToleranceConfig, ConfigError, OrchestratorConfig, PipelineConfig, ResolverConfig,
    TimeoutConfig,
};
