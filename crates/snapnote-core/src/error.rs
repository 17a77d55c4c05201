//! Error types for snapnote-core

use thiserror::Error;

/// Result type alias using snapnote-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in snapnote-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required field is missing or out of range
    #[error("Validation error: {0}")]
    Validation(String),

    /// Malformed input data (data URLs, import payloads)
    #[error("Format error: {0}")]
    Format(String),

    /// Referenced note or category does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// `SQLite` error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
