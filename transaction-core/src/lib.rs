//! Transaction Core
//!
//! Shared domain types for the settlement intake and batch optimization services.
//!
//! # Construction boundary
//!
//! Every identifier type validates its static constraints (length, character set,
//! currency membership) when it is built, whether through the typed builder or
//! through serde deserialization. Code that holds a [`TransactionRequest`] can rely
//! on those field constraints; cross-field business rules are left to the intake
//! pipeline.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod error;
pub mod types;

// Re-exports
pub use error::{FieldError, Result};
pub use types::{
    AccountId, CounterpartyId, Currency, IdempotencyKey, SettlementWindow, TransactionId,
    TransactionRequest, TransactionRequestBuilder, TransactionResponse, TransactionStatus,
};
