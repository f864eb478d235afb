// ABOUTME: Unified error taxonomy for the model orchestration layer
// ABOUTME: Defines ErrorCode, ErrorCategory, AppError and the JSON error envelope
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FridgeChef Contributors

//! # Unified Error Handling System
//!
//! Every failure surfaced by the flows is an [`AppError`] carrying a
//! machine-checkable [`ErrorCode`] plus a human-readable message. Codes are
//! grouped into the four caller-facing categories of [`ErrorCategory`]:
//!
//! - **Input validation**: rejected before any model call is made
//! - **Provider**: transport or provider-level failures (network, timeout, rate limit, bad payload)
//! - **Schema violation**: model output that does not match the declared shape
//! - **Empty result**: structurally valid output that carries nothing useful

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard error codes used throughout the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Input validation (3000-3999)
    /// Generic invalid input
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    /// A required parameter was missing or blank
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField = 3001,
    /// The supplied media is not an image
    #[serde(rename = "UNSUPPORTED_MEDIA_TYPE")]
    UnsupportedMediaType = 3002,

    // Provider (5000-5999)
    /// Connection could not be established or broke mid-flight
    #[serde(rename = "NETWORK_FAILURE")]
    NetworkFailure = 5000,
    /// The provider did not answer within the configured timeout
    #[serde(rename = "PROVIDER_TIMEOUT")]
    ProviderTimeout = 5001,
    /// The provider rejected the call because of rate limits or quota
    #[serde(rename = "RATE_LIMITED")]
    RateLimited = 5002,
    /// The provider returned a payload that could not be decoded
    #[serde(rename = "INVALID_RESPONSE")]
    InvalidResponse = 5003,
    /// The provider rejected our credentials
    #[serde(rename = "PROVIDER_AUTH_FAILED")]
    ProviderAuthFailed = 5004,

    // Configuration (6000-6999)
    /// Generic configuration error
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,
    /// Required configuration is missing
    #[serde(rename = "CONFIG_MISSING")]
    ConfigMissing = 6001,

    // Model output (7000-7999)
    /// Model output does not match the declared shape
    #[serde(rename = "SCHEMA_VIOLATION")]
    SchemaViolation = 7000,
    /// Model output was valid but empty
    #[serde(rename = "EMPTY_RESULT")]
    EmptyResult = 7001,

    // Internal (9000-9999)
    /// An internal error occurred
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// Serialization of an outgoing payload failed
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

/// Caller-facing error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad caller input, detected before any model call
    InputValidation,
    /// Transport or provider-level failure
    Provider,
    /// Model output did not match the declared shape
    SchemaViolation,
    /// Model output was structurally valid but empty
    EmptyResult,
    /// Misconfiguration of the client or provider
    Configuration,
    /// Bug or unexpected internal state
    Internal,
}

impl ErrorCode {
    /// Category of this error code
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput | Self::MissingRequiredField | Self::UnsupportedMediaType => {
                ErrorCategory::InputValidation
            }
            Self::NetworkFailure
            | Self::ProviderTimeout
            | Self::RateLimited
            | Self::InvalidResponse
            | Self::ProviderAuthFailed => ErrorCategory::Provider,
            Self::SchemaViolation => ErrorCategory::SchemaViolation,
            Self::EmptyResult => ErrorCategory::EmptyResult,
            Self::ConfigError | Self::ConfigMissing => ErrorCategory::Configuration,
            Self::InternalError | Self::SerializationError => ErrorCategory::Internal,
        }
    }

    /// Whether a single immediate retry is allowed for this code
    ///
    /// Rate limits and validation failures are never retried; the caller decides
    /// whether to back off.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkFailure | Self::ProviderTimeout)
    }

    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required parameter is missing",
            Self::UnsupportedMediaType => "The provided file is not an image",
            Self::NetworkFailure => "The AI service could not be reached",
            Self::ProviderTimeout => "The AI service did not respond in time",
            Self::RateLimited => "The AI service rate limit was exceeded",
            Self::InvalidResponse => "The AI service returned an unreadable response",
            Self::ProviderAuthFailed => "Authentication with the AI service failed",
            Self::ConfigError => "Configuration error encountered",
            Self::ConfigMissing => "Required configuration is missing",
            Self::SchemaViolation => "The AI response did not match the expected format",
            Self::EmptyResult => "The AI response contained no usable result",
            Self::InternalError => "An internal error occurred",
            Self::SerializationError => "Data serialization failed",
        }
    }

    /// Stable wire name of this code (e.g. `RATE_LIMITED`)
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            Self::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            Self::NetworkFailure => "NETWORK_FAILURE",
            Self::ProviderTimeout => "PROVIDER_TIMEOUT",
            Self::RateLimited => "RATE_LIMITED",
            Self::InvalidResponse => "INVALID_RESPONSE",
            Self::ProviderAuthFailed => "PROVIDER_AUTH_FAILED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::ConfigMissing => "CONFIG_MISSING",
            Self::SchemaViolation => "SCHEMA_VIOLATION",
            Self::EmptyResult => "EMPTY_RESULT",
            Self::InternalError => "INTERNAL_ERROR",
            Self::SerializationError => "SERIALIZATION_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the workspace
#[derive(Debug, Error)]
#[error("{}: {}", .code.description(), .message)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Structured details (violations, provider status, ...)
    pub details: serde_json::Value,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: serde_json::Value::Null,
            source: None,
        }
    }

    /// Attach structured details
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Category of this error
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Whether the invocation client may retry this error once
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

/// Convenience constructors for common errors
impl AppError {
    /// Invalid input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Required parameter missing or blank
    #[must_use]
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("Required parameter '{field}' is missing or empty"),
        )
    }

    /// Media type is not an image
    #[must_use]
    pub fn unsupported_media_type(mime_type: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedMediaType,
            format!("Invalid file type '{mime_type}'. Please upload an image."),
        )
    }

    /// Network failure talking to a provider
    #[must_use]
    pub fn network_failure(provider: &str, message: impl fmt::Display) -> Self {
        Self::new(ErrorCode::NetworkFailure, format!("{provider}: {message}"))
    }

    /// Provider timeout
    #[must_use]
    pub fn provider_timeout(provider: &str, message: impl fmt::Display) -> Self {
        Self::new(ErrorCode::ProviderTimeout, format!("{provider}: {message}"))
    }

    /// Provider rate limit or quota exhaustion
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimited, message)
    }

    /// Undecodable provider payload
    #[must_use]
    pub fn invalid_response(provider: &str, message: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InvalidResponse, format!("{provider}: {message}"))
    }

    /// Model output did not match the declared shape
    #[must_use]
    pub fn schema_violation(shape: &str, violations: Vec<String>) -> Self {
        let message = format!("{shape}: {}", violations.join("; "));
        Self::new(ErrorCode::SchemaViolation, message).with_details(serde_json::json!({
            "shape": shape,
            "violations": violations,
        }))
    }

    /// Structurally valid but empty model output
    #[must_use]
    pub fn empty_result(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EmptyResult, message)
    }

    /// Configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// JSON error envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error body
    pub error: ErrorResponseDetails,
}

/// Body of the JSON error envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine-checkable error code
    pub code: ErrorCode,
    /// Category the code belongs to
    pub category: ErrorCategory,
    /// Human-readable message
    pub message: String,
    /// Structured details, omitted when empty
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                category: error.code.category(),
                message: error.message.clone(),
                details: error.details.clone(),
            },
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self::from(&error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string()).with_source(error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_categories() {
        assert_eq!(
            ErrorCode::UnsupportedMediaType.category(),
            ErrorCategory::InputValidation
        );
        assert_eq!(ErrorCode::RateLimited.category(), ErrorCategory::Provider);
        assert_eq!(ErrorCode::InvalidResponse.category(), ErrorCategory::Provider);
        assert_eq!(
            ErrorCode::SchemaViolation.category(),
            ErrorCategory::SchemaViolation
        );
        assert_eq!(ErrorCode::EmptyResult.category(), ErrorCategory::EmptyResult);
    }

    #[test]
    fn test_only_transient_codes_are_retryable() {
        assert!(ErrorCode::NetworkFailure.is_retryable());
        assert!(ErrorCode::ProviderTimeout.is_retryable());
        assert!(!ErrorCode::RateLimited.is_retryable());
        assert!(!ErrorCode::InvalidResponse.is_retryable());
        assert!(!ErrorCode::SchemaViolation.is_retryable());
    }

    #[test]
    fn test_schema_violation_carries_details() {
        let error = AppError::schema_violation("Recipe", vec!["name is empty".to_owned()]);
        assert_eq!(error.code, ErrorCode::SchemaViolation);
        assert_eq!(error.details["shape"], "Recipe");
        assert_eq!(error.details["violations"][0], "name is empty");
        assert!(error.to_string().contains("expected format"));
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ErrorResponse::from(AppError::rate_limited("slow down"));
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("RATE_LIMITED"));
        assert!(json.contains("\"category\":\"provider\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_wire_name_matches_serde() {
        let json = serde_json::to_string(&ErrorCode::ProviderTimeout).unwrap();
        assert_eq!(json, format!("\"{}\"", ErrorCode::ProviderTimeout.as_str()));
    }
}
