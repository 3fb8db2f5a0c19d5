//! Error types for design operations.

use thiserror::Error;

/// Result type for design operations.
pub type DesignResult<T> = Result<T, DesignError>;

/// Errors that can occur in design operations.
///
/// Sanitization never produces these; it always coerces to a valid value.
/// They surface only where a caller hands the store something it cannot
/// interpret at all.
#[derive(Debug, Error)]
pub enum DesignError {
    /// Element not found in the document.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// Document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Payload root was not a JSON object.
    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}
