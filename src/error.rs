//! Error types for the calstore crate.

use thiserror::Error;

/// Errors that can occur in event store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Storage fault: {0}")]
    Fault(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Calendar not empty: {0}")]
    NotEmpty(String),

    #[error("Malformed row: {0}")]
    MalformedRow(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for calstore operations.
pub type StoreResult<T> = Result<T, StoreError>;
