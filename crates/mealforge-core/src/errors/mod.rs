// ABOUTME: Unified error type and error codes shared by every pipeline stage
// ABOUTME: Provides AppError with context, chaining, and convenience constructors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Pipeline stages never surface these errors to the caller of a meal plan
//! request: decoding, resolution, and enforcement failures all degrade to
//! empty or annotated results. `AppError` is the currency between the
//! pipeline and its collaborators (text generator, fact provider, config).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes, grouped by origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Caller-supplied data could not be used (files, request documents)
    InvalidInput = 3000,

    /// Collaborator answered with an error
    ExternalServiceError = 5000,
    /// Collaborator unreachable or answering 5xx
    ExternalServiceUnavailable = 5001,
    /// Collaborator rejected our credentials
    ExternalAuthFailed = 5002,
    /// Collaborator throttled the request
    ExternalRateLimited = 5003,
    /// Collaborator exceeded its time budget
    ExternalTimeout = 5004,

    /// Configuration could not be loaded or validated
    ConfigError = 6000,

    /// Unexpected internal failure
    InternalError = 9000,
    /// Payload could not be serialized or parsed
    SerializationError = 9003,
}

impl ErrorCode {
    /// Short description used as the display prefix
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "Invalid input",
            Self::ExternalServiceError => "External service error",
            Self::ExternalServiceUnavailable => "External service unavailable",
            Self::ExternalAuthFailed => "External service authentication failed",
            Self::ExternalRateLimited => "External service rate limit exceeded",
            Self::ExternalTimeout => "External service timed out",
            Self::ConfigError => "Configuration error",
            Self::InternalError => "Internal error",
            Self::SerializationError => "Serialization error",
        }
    }

    /// Whether a later call to the same collaborator may succeed
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ExternalServiceUnavailable | Self::ExternalRateLimited | Self::ExternalTimeout
        )
    }
}

/// Error passed between the pipeline and its collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message, prefixed with the service name for external errors
    pub message: String,
}

impl AppError {
    /// Create an error with `code` and `message`
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// Error reported by `service`
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }

    /// `service` gave no answer within `seconds`
    pub fn timeout(service: impl Into<String>, seconds: u64) -> Self {
        Self::new(
            ErrorCode::ExternalTimeout,
            format!("{}: no response within {seconds}s", service.into()),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_service_message_includes_service() {
        let error = AppError::external_service("USDA API", "HTTP 503");
        assert_eq!(error.code, ErrorCode::ExternalServiceError);
        assert_eq!(error.to_string(), "External service error: USDA API: HTTP 503");
        assert!(!error.code.is_transient());
    }

    #[test]
    fn test_timeout_is_transient() {
        let error = AppError::timeout("LLM", 120);
        assert_eq!(error.message, "LLM: no response within 120s");
        assert!(error.code.is_transient());
    }

    #[test]
    fn test_error_code_serializes_screaming_name() {
        let json = serde_json::to_string(&ErrorCode::ExternalTimeout).unwrap_or_default();
        assert_eq!(json, "\"EXTERNAL_TIMEOUT\"");
    }
}
