// ABOUTME: Pipeline tuning configuration for calorie tolerance, fact matching, and retry bounds
// ABOUTME: Loads defaults, applies environment overrides, and validates ranges
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Pipeline Configuration Module
//!
//! Every empirically chosen threshold in the pipeline is configuration rather
//! than a constant:
//!
//! ```bash
//! export CALORIE_ABOUT_TOLERANCE=0.15
//! export CALORIE_MIN_DELTA=150
//! export USDA_MIN_MATCH=0.5
//! export USDA_PAGE_SIZE=10
//! export USDA_INCLUDE_BRANDED=true
//! export MEALFORGE_MAX_MODEL_ATTEMPTS=3
//! ```

use mealforge_core::constants::datasets;
use mealforge_core::errors::AppError;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value violated a relationship or bound
    #[error("Invalid range: {0}")]
    InvalidRange(&'static str),

    /// Environment variable could not be read
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Environment variable could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// A value is outside its accepted domain
    #[error("Value out of range: {0}")]
    ValueOutOfRange(&'static str),
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        Self::config(error.to_string())
    }
}

/// Tolerance applied to `about` calorie rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalorieToleranceConfig {
    /// Fraction of the target allowed on either side (0.20 = ±20%)
    pub about_tolerance: f64,
    /// Minimum absolute slack in kcal, used when the percentage is smaller
    pub min_delta: u32,
}

impl Default for CalorieToleranceConfig {
    fn default() -> Self {
        Self {
            about_tolerance: 0.20,
            min_delta: 200,
        }
    }
}

impl CalorieToleranceConfig {
    /// Slack in kcal for an `about` rule with the given target
    #[must_use]
    pub fn tolerance_for(&self, target: u32) -> u32 {
        if target == 0 {
            return self.min_delta;
        }
        let scaled = (f64::from(target) * self.about_tolerance).round().max(0.0) as u32;
        scaled.max(self.min_delta)
    }
}

/// Fact resolution tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolverConfig {
    /// Minimum query-token overlap for a confident match
    pub min_match_ratio: f64,
    /// Records requested per provider search
    pub page_size: u32,
    /// Whether branded consumer products are searched
    pub include_branded: bool,
    /// Calories per gram above which a non-fat record is rejected
    pub calorie_density_ceiling: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            min_match_ratio: 0.40,
            page_size: 8,
            include_branded: false,
            calorie_density_ceiling: 6.5,
        }
    }
}

impl ResolverConfig {
    /// Datasets to search, highest priority first
    #[must_use]
    pub fn data_types(&self) -> Vec<String> {
        let mut types = vec![
            datasets::FOUNDATION.to_owned(),
            datasets::SR_LEGACY.to_owned(),
            datasets::SURVEY_FNDDS.to_owned(),
        ];
        if self.include_branded {
            types.push(datasets::BRANDED.to_owned());
        }
        types
    }
}

/// Generation loop bounds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Generator invocations per request
    pub max_model_attempts: u32,
    /// Tool-call round trips per generator invocation
    pub max_tool_rounds: u32,
    /// Pantry anchor terms used for variety
    pub favorite_limit: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_model_attempts: 2,
            max_tool_rounds: 4,
            favorite_limit: 4,
        }
    }
}

/// Timeouts for external collaborators
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Text generator request timeout (seconds)
    pub generator_secs: u64,
    /// Nutrition fact provider request timeout (seconds)
    pub provider_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            generator_secs: 120,
            provider_secs: 5,
        }
    }
}

impl TimeoutConfig {
    /// Generator timeout as a `Duration`
    #[must_use]
    pub const fn generator(&self) -> Duration {
        Duration::from_secs(self.generator_secs)
    }

    /// Provider timeout as a `Duration`
    #[must_use]
    pub const fn provider(&self) -> Duration {
        Duration::from_secs(self.provider_secs)
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Calorie rule tolerance
    pub calorie: CalorieToleranceConfig,
    /// Fact resolution tuning
    pub resolver: ResolverConfig,
    /// Generation loop bounds
    pub orchestrator: OrchestratorConfig,
    /// External call timeouts
    pub timeouts: TimeoutConfig,
}

/// Global configuration singleton
static PIPELINE_CONFIG: OnceLock<PipelineConfig> = OnceLock::new();

impl PipelineConfig {
    /// Get the global configuration instance
    pub fn global() -> &'static Self {
        PIPELINE_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                tracing::warn!("Failed to load pipeline config: {}, using defaults", e);
                Self::default()
            })
        })
    }

    /// Load configuration from defaults and environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values or validation fails
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::default().apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error naming the first out-of-range value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.calorie.about_tolerance) {
            return Err(ConfigError::ValueOutOfRange(
                "calorie about_tolerance must be within [0, 1]",
            ));
        }

        if !(0.0..=1.0).contains(&self.resolver.min_match_ratio) {
            return Err(ConfigError::ValueOutOfRange(
                "resolver min_match_ratio must be within [0, 1]",
            ));
        }

        if self.resolver.page_size == 0 || self.resolver.page_size > 200 {
            return Err(ConfigError::InvalidRange(
                "resolver page_size must be between 1 and 200",
            ));
        }

        if self.resolver.calorie_density_ceiling <= 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "resolver calorie_density_ceiling must be positive",
            ));
        }

        if self.orchestrator.max_model_attempts == 0 {
            return Err(ConfigError::InvalidRange(
                "orchestrator max_model_attempts must be at least 1",
            ));
        }

        if self.timeouts.generator_secs == 0 || self.timeouts.provider_secs == 0 {
            return Err(ConfigError::InvalidRange("timeouts must be at least 1 second"));
        }

        Ok(())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(val) = std::env::var("CALORIE_ABOUT_TOLERANCE") {
            self.calorie.about_tolerance = val
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid CALORIE_ABOUT_TOLERANCE".into()))?;
        }

        if let Ok(val) = std::env::var("CALORIE_MIN_DELTA") {
            self.calorie.min_delta = val
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid CALORIE_MIN_DELTA".into()))?;
        }

        if let Ok(val) = std::env::var("USDA_MIN_MATCH") {
            self.resolver.min_match_ratio = val
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid USDA_MIN_MATCH".into()))?;
        }

        if let Ok(val) = std::env::var("USDA_PAGE_SIZE") {
            self.resolver.page_size = val
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid USDA_PAGE_SIZE".into()))?;
        }

        if let Ok(val) = std::env::var("USDA_INCLUDE_BRANDED") {
            self.resolver.include_branded = val.trim().eq_ignore_ascii_case("true");
        }

        if let Ok(val) = std::env::var("MEALFORGE_MAX_MODEL_ATTEMPTS") {
            self.orchestrator.max_model_attempts = val
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid MEALFORGE_MAX_MODEL_ATTEMPTS".into()))?;
        }

        if let Ok(val) = std::env::var("MEALFORGE_MAX_TOOL_ROUNDS") {
            self.orchestrator.max_tool_rounds = val
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid MEALFORGE_MAX_TOOL_ROUNDS".into()))?;
        }

        if let Ok(val) = std::env::var("MEALFORGE_GENERATOR_TIMEOUT_SECS") {
            self.timeouts.generator_secs = val.parse().map_err(|_| {
                ConfigError::Parse("Invalid MEALFORGE_GENERATOR_TIMEOUT_SECS".into())
            })?;
        }

        if let Ok(val) = std::env::var("MEALFORGE_PROVIDER_TIMEOUT_SECS") {
            self.timeouts.provider_secs = val.parse().map_err(|_| {
                ConfigError::Parse("Invalid MEALFORGE_PROVIDER_TIMEOUT_SECS".into())
            })?;
        }

        Ok(self)
    }
}
