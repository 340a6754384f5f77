//! Error types for transaction construction

use thiserror::Error;

/// Result type for field construction
pub type Result<T> = std::result::Result<T, FieldError>;

/// Static field constraint violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Required field is empty
    #[error("{field} must not be empty")]
    Empty {
        /// Field name
        field: &'static str,
    },

    /// Field exceeds its maximum length
    #[error("{field} exceeds {max} characters")]
    TooLong {
        /// Field name
        field: &'static str,
        /// Maximum allowed length
        max: usize,
    },

    /// Field has an invalid format
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat {
        /// Field name
        field: &'static str,
        /// Description of the violation
        reason: String,
    },

    /// Currency is not in the supported set
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// Required field was never set on the builder
    #[error("{0} is required")]
    Missing(&'static str),
}
