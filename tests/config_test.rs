// ABOUTME: Integration tests for pipeline and logging configuration from the environment
// ABOUTME: Runs serially because every test mutates process environment variables
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use mealforge::config::{ConfigError, PipelineConfig};
use mealforge::errors::{AppError, ErrorCode};
use mealforge::logging::{LogFormat, LoggingConfig};
use serial_test::serial;
use std::env;

const PIPELINE_VARS: &[&str] = &[
    "CALORIE_ABOUT_TOLERANCE",
    "CALORIE_MIN_DELTA",
    "USDA_MIN_MATCH",
    "USDA_PAGE_SIZE",
    "USDA_INCLUDE_BRANDED",
    "MEALFORGE_MAX_MODEL_ATTEMPTS",
    "MEALFORGE_MAX_TOOL_ROUNDS",
    "MEALFORGE_GENERATOR_TIMEOUT_SECS",
    "MEALFORGE_PROVIDER_TIMEOUT_SECS",
];

fn clear_pipeline_vars() {
    for var in PIPELINE_VARS {
        env::remove_var(var);
    }
}

// ============================================================================
// Pipeline configuration
// ============================================================================

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_pipeline_vars();
    let config = PipelineConfig::load().unwrap();

    assert_eq!(config, PipelineConfig::default());
    assert!((config.calorie.about_tolerance - 0.20).abs() < f64::EPSILON);
    assert_eq!(config.calorie.min_delta, 200);
    assert_eq!(config.orchestrator.max_model_attempts, 2);
    assert_eq!(config.resolver.data_types().len(), 3);
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_pipeline_vars();
    env::set_var("CALORIE_ABOUT_TOLERANCE", "0.1");
    env::set_var("CALORIE_MIN_DELTA", "50");
    env::set_var("USDA_PAGE_SIZE", "20");
    env::set_var("USDA_INCLUDE_BRANDED", "TRUE");
    env::set_var("MEALFORGE_MAX_MODEL_ATTEMPTS", "3");

    let config = PipelineConfig::load().unwrap();

    assert_eq!(config.calorie.tolerance_for(1000), 100);
    assert_eq!(config.calorie.tolerance_for(300), 50);
    assert_eq!(config.resolver.page_size, 20);
    assert!(config.resolver.include_branded);
    assert_eq!(config.resolver.data_types().len(), 4);
    assert_eq!(config.orchestrator.max_model_attempts, 3);

    clear_pipeline_vars();
}

#[test]
#[serial]
fn test_unparsable_value_is_rejected() {
    clear_pipeline_vars();
    env::set_var("USDA_MIN_MATCH", "most");

    let error = PipelineConfig::load().unwrap_err();
    assert!(matches!(error, ConfigError::Parse(_)));

    let app_error: AppError = error.into();
    assert_eq!(app_error.code, ErrorCode::ConfigError);

    clear_pipeline_vars();
}

#[test]
#[serial]
fn test_out_of_range_values_fail_validation() {
    clear_pipeline_vars();
    env::set_var("CALORIE_ABOUT_TOLERANCE", "1.5");
    assert!(matches!(
        PipelineConfig::load(),
        Err(ConfigError::ValueOutOfRange(_))
    ));

    clear_pipeline_vars();
    env::set_var("MEALFORGE_MAX_MODEL_ATTEMPTS", "0");
    assert!(matches!(
        PipelineConfig::load(),
        Err(ConfigError::InvalidRange(_))
    ));

    clear_pipeline_vars();
    env::set_var("USDA_PAGE_SIZE", "0");
    assert!(PipelineConfig::load().is_err());

    clear_pipeline_vars();
}

// ============================================================================
// Logging configuration
// ============================================================================

#[test]
#[serial]
fn test_logging_config_from_env() {
    env::set_var("RUST_LOG", "debug");
    env::set_var("LOG_FORMAT", "json");
    env::set_var("ENVIRONMENT", "production");
    env::set_var("SERVICE_NAME", "mealforge-test");

    let config = LoggingConfig::from_env();

    assert_eq!(config.level, "debug");
    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.environment, "production");
    assert_eq!(config.service_name, "mealforge-test");
    assert!(config.include_location);
    assert!(config.include_thread);

    env::remove_var("RUST_LOG");
    env::remove_var("LOG_FORMAT");
    env::remove_var("ENVIRONMENT");
    env::remove_var("SERVICE_NAME");
}

#[test]
#[serial]
fn test_default_logging_config() {
    let config = LoggingConfig::default();

    assert_eq!(config.level, "info");
    assert_eq!(config.format, LogFormat::Pretty);
    assert_eq!(config.environment, "development");
    assert_eq!(config.service_name, "mealforge");
    assert!(!config.include_location);
}

#[test]
fn test_log_format_names() {
    assert_eq!(LogFormat::from_name("JSON"), LogFormat::Json);
    assert_eq!(LogFormat::from_name("compact"), LogFormat::Compact);
    assert_eq!(LogFormat::from_name("fancy"), LogFormat::Pretty);
}
