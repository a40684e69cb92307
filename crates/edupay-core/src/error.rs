//! Error Types

use thiserror::Error;

/// Result type alias for catalog/domain operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Domain error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// No item with this kind/id exists
    #[error("Item not found: {kind}/{id}")]
    ItemNotFound { kind: String, id: String },

    /// A record crossing the store boundary failed validation
    #[error("Malformed item payload: {0}")]
    MalformedItem(String),

    /// Amount could not be represented in integer minor units
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Storage(_))
    }
}
