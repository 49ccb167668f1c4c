//! Common error types for KitaDoc

use thiserror::Error;

/// Common result type for KitaDoc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across KitaDoc crates
#[derive(Error, Debug)]
pub enum Error {
    /// Required field missing or field value malformed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Requested record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record with the same identity already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Persisted collection could not be read or written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build a validation error naming every missing field
    pub fn missing_fields(fields: &[&str]) -> Self {
        Error::Validation(format!("{} required", fields.join(", ")))
    }
}
