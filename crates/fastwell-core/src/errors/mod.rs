// ABOUTME: Unified error handling with standard error codes and domain error conversions
// ABOUTME: Defines AppError, ErrorCode, ErrorContext, and re-exports the domain error enums
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Fastwell Contributors

//! # Unified Error Handling System
//!
//! Domain components return their own `thiserror` enums (`SessionError`,
//! `StoreError`, `AdviceError`, `FeedbackError`, `ConfigError`). At the
//! application boundary those collapse into `AppError`, which carries a
//! stable `ErrorCode` plus optional context for structured logging.

mod advice;
mod config;
mod feedback;
mod session;
mod store;

pub use advice::AdviceError;
pub use config::ConfigError;
pub use feedback::FeedbackError;
pub use session::SessionError;
pub use store::StoreError;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    /// Generic invalid input
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    /// Numeric value outside the accepted range
    #[serde(rename = "VALUE_OUT_OF_RANGE")]
    ValueOutOfRange = 3003,

    // Resource Management (4000-4999)
    /// Entity does not exist
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound = 4000,
    /// A fasting session is already open for the user
    #[serde(rename = "SESSION_CONFLICT")]
    SessionConflict = 4001,
    /// Command does not match the session's current state
    #[serde(rename = "INVALID_STATE_TRANSITION")]
    InvalidStateTransition = 4002,
    /// Optimistic concurrency check failed
    #[serde(rename = "VERSION_CONFLICT")]
    VersionConflict = 4003,

    // External Services (5000-5999)
    /// Knowledge retrieval or text generation backend failed
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    /// Backend did not answer in time
    #[serde(rename = "EXTERNAL_SERVICE_TIMEOUT")]
    ExternalServiceTimeout = 5001,
    /// Backend answered with something that is not the requested structure
    #[serde(rename = "GENERATION_PARSE_ERROR")]
    GenerationParseError = 5002,

    // Configuration (6000-6999)
    /// Configuration could not be loaded or is invalid
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError = 6000,

    // Internal Errors (9000-9999)
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// Persistence layer failure
    #[serde(rename = "STORAGE_ERROR")]
    StorageError = 9002,
    /// Data serialization/deserialization failed
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::ValueOutOfRange => "A value is outside the accepted range",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::SessionConflict => "A fasting session is already in progress",
            Self::InvalidStateTransition => "The fasting session cannot do that right now",
            Self::VersionConflict => "The record was changed concurrently",
            Self::ExternalServiceError => "An external service failed",
            Self::ExternalServiceTimeout => "An external service timed out",
            Self::GenerationParseError => "Generated content could not be parsed",
            Self::ConfigError => "Configuration error",
            Self::InternalError => "An internal error occurred",
            Self::StorageError => "Storage operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }

    /// Whether the caller is expected to react to this error (show it to the user)
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput
                | Self::ValueOutOfRange
                | Self::ResourceNotFound
                | Self::SessionConflict
                | Self::InvalidStateTransition
        )
    }
}

/// Additional context that can be attached to errors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// User ID if available
    pub user_id: Option<Uuid>,
    /// Resource ID if applicable
    pub resource_id: Option<String>,
    /// Additional key-value context
    pub details: Value,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            user_id: None,
            resource_id: None,
            details: Value::Object(Map::new()),
        }
    }
}

/// Unified error type for the application boundary
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    pub context: ErrorContext,
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
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add a user ID to the error context
    #[must_use]
    pub const fn with_user_id(mut self, user_id: Uuid) -> Self {
        self.context.user_id = Some(user_id);
        self
    }

    /// Add a resource ID to the error context
    #[must_use]
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.context.resource_id = Some(resource_id.into());
        self
    }

    /// Add details to the error context
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.context.details = details;
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Resource not found
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Invalid input
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal error
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Storage error
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// External service error
    #[must_use]
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        let code = match &error {
            StoreError::NotFound { .. } => ErrorCode::ResourceNotFound,
            StoreError::VersionConflict { .. } => ErrorCode::VersionConflict,
            StoreError::Serialization(_) => ErrorCode::SerializationError,
            StoreError::Backend(_) => ErrorCode::StorageError,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

impl From<SessionError> for AppError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::Conflict {
                user_id,
                session_id,
            } => Self::new(
                ErrorCode::SessionConflict,
                format!("session {session_id} is still open"),
            )
            .with_user_id(user_id)
            .with_resource_id(session_id.to_string()),
            SessionError::InvalidTransition { .. } => {
                Self::new(ErrorCode::InvalidStateTransition, error.to_string())
            }
            SessionError::InvalidTarget(message) => {
                Self::new(ErrorCode::ValueOutOfRange, message)
            }
            SessionError::Persistence(store) => Self::from(store),
        }
    }
}

impl From<AdviceError> for AppError {
    fn from(error: AdviceError) -> Self {
        let code = match &error {
            AdviceError::RetrievalUnavailable(_) | AdviceError::GenerationUnavailable(_) => {
                ErrorCode::ExternalServiceError
            }
            AdviceError::Timeout { .. } => ErrorCode::ExternalServiceTimeout,
            AdviceError::GenerationParse(_) => ErrorCode::GenerationParseError,
            AdviceError::Persistence(_) => ErrorCode::StorageError,
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

impl From<FeedbackError> for AppError {
    fn from(error: FeedbackError) -> Self {
        match error {
            FeedbackError::InvalidRating(_) => {
                Self::new(ErrorCode::ValueOutOfRange, error.to_string())
            }
            FeedbackError::AdviceNotFound(id) => {
                Self::not_found(format!("advice {id}")).with_resource_id(id.to_string())
            }
            FeedbackError::Persistence(store) => Self::from(store),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        Self::config(error.to_string()).with_source(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(ErrorCode::SerializationError, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FastingState, SessionCommand};

    #[test]
    fn test_session_conflict_maps_to_user_facing_code() {
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let error = AppError::from(SessionError::Conflict {
            user_id,
            session_id,
        });

        assert_eq!(error.code, ErrorCode::SessionConflict);
        assert!(error.code.is_user_facing());
        assert_eq!(error.context.user_id, Some(user_id));
        assert_eq!(
            error.context.resource_id.as_deref(),
            Some(session_id.to_string().as_str())
        );
    }

    #[test]
    fn test_invalid_transition_message_names_state_and_command() {
        let error = SessionError::InvalidTransition {
            from: FastingState::Idle,
            command: SessionCommand::Pause,
        };
        let text = error.to_string();
        assert!(text.contains("pause"));
        assert!(text.contains("idle"));

        let app = AppError::from(error);
        assert_eq!(app.code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn test_persistence_error_keeps_store_code() {
        let error = AppError::from(SessionError::Persistence(StoreError::VersionConflict {
            expected: 2,
            actual: 3,
        }));
        assert_eq!(error.code, ErrorCode::VersionConflict);
        assert!(!error.code.is_user_facing());
    }

    #[test]
    fn test_error_code_serializes_screaming_case() {
        let json = serde_json::to_string(&ErrorCode::GenerationParseError).unwrap();
        assert_eq!(json, "\"GENERATION_PARSE_ERROR\"");
    }
}
