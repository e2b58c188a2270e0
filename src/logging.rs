// ABOUTME: Logging configuration and structured logging setup for the meal-plan pipeline
// ABOUTME: Configures log levels, formatters, and pipeline event helpers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Structured logging configuration
//!
//! Everything is written to stderr; stdout carries only command output.

use crate::constants::service_names;
use anyhow::Result;
use std::env;
use std::io;
use tracing::{info, warn};
use tracing_subscriber::{
    filter::Directive,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Dependencies whose debug output drowns pipeline events
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Logging configuration
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct LoggingConfig {
    /// Filter directive (`info`, `debug`, `mealforge=trace,warn`, ...)
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include thread ids and names
    pub include_thread: bool,
    /// Emit span open/close events
    pub include_spans: bool,
    /// Service name reported at startup
    pub service_name: String,
    /// Service version reported at startup
    pub service_version: String,
    /// Deployment environment (development, staging, production)
    pub environment: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-field human-readable lines
    Pretty,
    /// Single-line terse output
    Compact,
}

impl LogFormat {
    /// Parse a format name, defaulting to `Pretty`
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_thread: false,
            include_spans: false,
            service_name: service_names::MEALFORGE.into(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
            environment: "development".into(),
        }
    }
}

impl LoggingConfig {
    /// Read `RUST_LOG`, `LOG_FORMAT`, `ENVIRONMENT`, `SERVICE_NAME`, `SERVICE_VERSION`
    /// and the `LOG_INCLUDE_*` switches
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        // Production logs always carry location and thread
        let production = environment == "production";
        let switch = |name: &str| production || env::var(name).is_ok();

        Self {
            level: env::var("RUST_LOG").unwrap_or(defaults.level),
            format: env::var("LOG_FORMAT")
                .map_or(defaults.format, |name| LogFormat::from_name(&name)),
            include_location: switch("LOG_INCLUDE_LOCATION"),
            include_thread: switch("LOG_INCLUDE_THREAD"),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            service_name: env::var("SERVICE_NAME").unwrap_or(defaults.service_name),
            service_version: env::var("SERVICE_VERSION").unwrap_or(defaults.service_version),
            environment,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        QUIET_TARGETS
            .iter()
            .filter_map(|target| format!("{target}=warn").parse::<Directive>().ok())
            .fold(EnvFilter::new(&self.level), EnvFilter::add_directive)
    }

    /// Install the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let layer = fmt::layer()
            .with_writer(io::stderr)
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_thread_ids(self.include_thread)
            .with_thread_names(self.include_thread)
            .with_span_events(span_events);
        let registry = tracing_subscriber::registry().with(self.env_filter());

        match self.format {
            LogFormat::Json => registry.with(layer.json().flatten_event(true)).try_init()?,
            LogFormat::Pretty => registry.with(layer).try_init()?,
            LogFormat::Compact => registry.with(layer.compact().with_target(false)).try_init()?,
        }

        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            "Logging initialized"
        );
        Ok(())
    }
}

/// Pipeline-specific structured log events
pub struct PipelineLogger;

impl PipelineLogger {
    /// Log the outcome of one generation attempt
    pub fn log_attempt(attempt: u32, decoded: usize, kept: usize, rejected: usize, partial: bool) {
        info!(
            attempt = attempt,
            meals.decoded = decoded,
            meals.kept = kept,
            meals.rejected = rejected,
            decode.partial = partial,
            "Generation attempt finished"
        );
    }

    /// Log a meal dropped by enforcement
    pub fn log_rejection(meal_name: &str, reason: &str) {
        info!(meal.name = %meal_name, rejection.reason = %reason, "Meal rejected");
    }

    /// Log a term the resolver could not ground
    pub fn log_unresolved(term: &str, cause: &str) {
        warn!(ingredient.term = %term, resolution.cause = %cause, "Ingredient unresolved");
    }

    /// Log a fact match below the confidence threshold
    pub fn log_low_confidence(term: &str, description: &str, overlap: f64) {
        warn!(
            ingredient.term = %term,
            fact.description = %description,
            fact.overlap = overlap,
            "Low-confidence nutrition match"
        );
    }
}
