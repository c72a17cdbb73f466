//! Error types for the Mtaa planner.

use thiserror::Error;

use crate::types::Category;

/// Main error type for Mtaa operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MtaaError {
    /// A category fetcher failed (network, parse, empty or invalid response).
    #[error("Fetch failed for {category}: {message}")]
    Fetch { category: Category, message: String },

    /// A category fetch exceeded its deadline.
    #[error("Fetch for {category} timed out after {duration_ms}ms")]
    Timeout { category: Category, duration_ms: u64 },

    /// Cache store read or write failed.
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Text generation model failed or is unavailable.
    #[error("Model {model} failed: {message}")]
    Model { model: String, message: String },

    /// Caller supplied invalid input.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource not found.
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MtaaError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        MtaaError::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a category-scoped fetch failure.
    pub fn fetch(category: Category, message: impl Into<String>) -> Self {
        MtaaError::Fetch {
            category,
            message: message.into(),
        }
    }

    /// Returns true if this error is recoverable.
    ///
    /// Recoverable errors degrade a single category or a single narrative;
    /// everything else aborts the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MtaaError::Fetch { .. }
                | MtaaError::Timeout { .. }
                | MtaaError::Cache { .. }
                | MtaaError::Model { .. }
        )
    }

    /// Returns the category if this error is category-scoped.
    pub fn category(&self) -> Option<Category> {
        match self {
            MtaaError::Fetch { category, .. } => Some(*category),
            MtaaError::Timeout { category, .. } => Some(*category),
            _ => None,
        }
    }
}

/// Convenience Result type for Mtaa operations.
pub type Result<T> = std::result::Result<T, MtaaError>;

impl From<serde_json::Error> for MtaaError {
    fn from(err: serde_json::Error) -> Self {
        MtaaError::Serialization(err.to_string())
    }
}
