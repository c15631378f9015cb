//! Error types

use thiserror::Error;

/// Failure reading or writing the key-value store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned: {0}")]
    Poisoned(String),
}

/// Errors surfaced by funnel operations
#[derive(Error, Debug)]
pub enum FunnelError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    MissingPrerequisite(String),

    #[error("Failed to lock {0}")]
    StatePoisoned(String),
}

/// Result type alias using FunnelError
pub type Result<T> = std::result::Result<T, FunnelError>;
