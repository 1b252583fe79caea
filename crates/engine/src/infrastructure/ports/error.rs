//! Error types for port operations.

use netevent_domain::DomainError;

/// Repository operation errors with context for debugging.
///
/// `NotFound` is kept apart from the infrastructure variants so callers can
/// answer "no such document" differently from "the store is unwell".
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepoError {
    /// Filter matched no document - includes entity type and filter description.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Database operation failed - includes operation name for tracing.
    #[error("Database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    /// A single store call exceeded its time budget.
    #[error("Timed out in {operation} after {after_ms}ms")]
    Timeout { operation: &'static str, after_ms: u64 },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A canonical identifier string could not be parsed.
    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}

impl RepoError {
    /// Create a NotFound error with entity type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create a Database error with operation context.
    pub fn database(operation: &'static str, message: impl ToString) -> Self {
        Self::Database {
            operation,
            message: message.to_string(),
        }
    }

    pub fn timeout(operation: &'static str, after_ms: u64) -> Self {
        Self::Timeout {
            operation,
            after_ms,
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<DomainError> for RepoError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidId(msg) => Self::InvalidId(msg),
            DomainError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            other => Self::Serialization(other.to_string()),
        }
    }
}
