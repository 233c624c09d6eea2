// Copyright 2025 Cowboy AI, LLC.

//! Error types for request lifecycle operations

use thiserror::Error;

/// Errors that can occur while submitting, deciding, assigning or querying requests
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// Referenced template, instance, user or assignee does not exist
    #[error("Entity not found: {entity_type} with id {id}")]
    EntityNotFound {
        /// Type of entity that wasn't found
        entity_type: String,
        /// ID or handle that was searched for
        id: String,
    },

    /// Role policy violation on status update or assignment
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A supplied value could not be interpreted (e.g. an unknown status name)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid state transition
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state
        from: String,
        /// Attempted target state
        to: String,
    },

    /// Concurrency conflict
    #[error("Concurrency conflict: expected version {expected}, but found {actual}")]
    ConcurrencyConflict {
        /// Expected version
        expected: u64,
        /// Actual version
        actual: u64,
    },

    /// Already exists error (generic)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// External service error
    #[error("External service error: {service} - {message}")]
    ExternalServiceError {
        /// Name of the external service
        service: String,
        /// Error message from the service
        message: String,
    },
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for DomainError {
    fn from(err: toml::de::Error) -> Self {
        DomainError::Configuration(err.to_string())
    }
}

impl DomainError {
    /// Shorthand for [`DomainError::EntityNotFound`]
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        DomainError::EntityNotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Shorthand for [`DomainError::Forbidden`]
    pub fn forbidden(reason: impl Into<String>) -> Self {
        DomainError::Forbidden(reason.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::EntityNotFound { .. })
    }

    /// Check if this is a role policy violation
    pub fn is_forbidden(&self) -> bool {
        matches!(self, DomainError::Forbidden(_))
    }

    /// Check if the caller supplied an unusable value
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidArgument(_) | DomainError::InvalidStateTransition { .. }
        )
    }

    /// Check if this is a concurrency error
    pub fn is_concurrency_error(&self) -> bool {
        matches!(self, DomainError::ConcurrencyConflict { .. })
    }
}
