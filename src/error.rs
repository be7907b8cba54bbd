//! Structured error types for lifecycle operations.

use crate::lifecycle::TransitionAction;
use crate::types::RequestStatus;
use serde::Serialize;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,

    // Not found errors
    RequestNotFound,
    KeyNotFound,

    // Conflict errors
    KeyAlreadyAttached,
    KeyInUse,
    InvalidTransition,

    // Collaborator / internal errors
    ChannelError,
    DatabaseError,
}

/// Error type for all lifecycle manager operations.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("request {id} not found")]
    RequestNotFound { id: i64 },

    #[error("no request found for correlation key {key}")]
    KeyNotFound { key: String },

    #[error("request {id} already has correlation key {key}")]
    KeyAlreadyAttached { id: i64, key: String },

    #[error("correlation key {key} is already attached to another request")]
    KeyInUse { key: String },

    #[error("cannot {action} a request that is {status}")]
    InvalidTransition {
        action: TransitionAction,
        status: RequestStatus,
    },

    #[error("channel delivery failed: {0}")]
    Channel(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl LifecycleError {
    pub fn code(&self) -> ErrorCode {
        match self {
            LifecycleError::MissingField { .. } => ErrorCode::MissingRequiredField,
            LifecycleError::InvalidField { .. } => ErrorCode::InvalidFieldValue,
            LifecycleError::RequestNotFound { .. } => ErrorCode::RequestNotFound,
            LifecycleError::KeyNotFound { .. } => ErrorCode::KeyNotFound,
            LifecycleError::KeyAlreadyAttached { .. } => ErrorCode::KeyAlreadyAttached,
            LifecycleError::KeyInUse { .. } => ErrorCode::KeyInUse,
            LifecycleError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            LifecycleError::Channel(_) => ErrorCode::ChannelError,
            LifecycleError::Database(_) => ErrorCode::DatabaseError,
        }
    }

    // Convenience constructors

    pub fn missing_field(field: &'static str) -> Self {
        LifecycleError::MissingField { field }
    }

    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        LifecycleError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    pub fn key_not_found(key: impl Into<String>) -> Self {
        LifecycleError::KeyNotFound { key: key.into() }
    }

    pub fn channel(err: impl std::fmt::Display) -> Self {
        LifecycleError::Channel(err.to_string())
    }
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = std::result::Result<T, LifecycleError>;
