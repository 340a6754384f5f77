//! Idempotency store boundary
//!
//! A key-value cache with per-key expiry. Keys are dedup keys (see
//! [`crate::dedup_key`]); values are serialized transaction responses.

mod memory;
mod redis;

pub use self::memory::{Clock, InMemoryIdempotencyStore, ManualClock, SystemClock};
pub use self::redis::RedisIdempotencyStore;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Idempotency store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Redis error
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    /// Store unavailable
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Invalid TTL
    #[error("Invalid TTL: {0}")]
    InvalidTtl(String),
}

/// Key-value cache with per-key expiry
///
/// Only single-key operations are required; no cross-key atomicity is assumed.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Get a live value
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a value with expiry, replacing any existing one
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Set a value with expiry only if no live value exists; returns whether it was set
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration)
        -> Result<bool, StoreError>;

    /// Remove a value
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
