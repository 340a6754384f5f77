//! Error types for intake service

use crate::{store::StoreError, validation::ValidationError};
use thiserror::Error;

/// Result type for intake operations
pub type Result<T> = std::result::Result<T, Error>;

/// Intake errors
#[derive(Error, Debug)]
pub enum Error {
    /// Business rule violation, reported before any side effect
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Static field constraint violation
    #[error("Invalid field: {0}")]
    Field(#[from] transaction_core::FieldError),

    /// Accepted transaction could not be published
    #[error(transparent)]
    Publish(#[from] message_bus::Error),

    /// Idempotency store error
    #[error("Idempotency store error: {0}")]
    Store(#[from] StoreError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the caller may retry the same submission
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Publish(_) | Error::Store(_))
    }
}
