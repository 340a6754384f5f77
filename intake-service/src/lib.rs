//! Intake Service
//!
//! Admits transfer requests exactly once per idempotency key (best effort) and
//! hands them to the ordered transaction log.
//!
//! # Pipeline
//!
//! 1. **Validate**: cross-field business rules (amount bounds, distinct accounts, counterparty)
//! 2. **Deduplicate**: SHA-256 of the idempotency key looked up in the idempotency store
//! 3. **Construct**: `submitted` response with fresh timestamps
//! 4. **Store**: cache the response under the dedup key (best effort)
//! 5. **Publish**: `transactions.intake`, keyed by transaction ID (fatal on failure)
//!
//! # Example
//!
//! ```no_run
//! use intake_service::{Config, IntakePipeline, RedisIdempotencyStore};
//! use message_bus::JetStreamPublisher;
//! use std::sync::Arc;
//!
//! # async fn run(request: transaction_core::TransactionRequest) -> intake_service::Result<()> {
//! let config = Config::from_env()?;
//! let store = Arc::new(RedisIdempotencyStore::connect(&config.redis_url).await?);
//! let publisher = Arc::new(JetStreamPublisher::connect(config.publisher.clone()).await?);
//! let pipeline = IntakePipeline::new(store, publisher, config);
//!
//! let (response, is_duplicate) = pipeline.submit(request).await?;
//! println!("{} duplicate={}", response.transaction_id(), is_duplicate);
//!
//! pipeline.shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod dedup;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod store;
pub mod validation;

// Re-exports
pub use config::Config;
pub use dedup::dedup_key;
pub use error::{Error, Result};
pub use pipeline::IntakePipeline;
pub use store::{
    Clock, IdempotencyStore, InMemoryIdempotencyStore, ManualClock, RedisIdempotencyStore,
    StoreError, SystemClock,
};
pub use validation::{TransactionValidator, ValidationError};
