//! Error types for message bus

use thiserror::Error;

/// Message bus error
#[derive(Debug, Error)]
pub enum Error {
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Publish error
    #[error("Publish error: {0}")]
    Publish(String),

    /// Broker did not acknowledge in time
    #[error("Publish timed out after {0} ms")]
    Timeout(u64),

    /// Stream creation error
    #[error("Stream creation error: {0}")]
    StreamCreation(String),

    /// Flush error
    #[error("Flush error: {0}")]
    Flush(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
