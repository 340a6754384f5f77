//! Message Bus with NATS support
//!
//! Provides ordered, partitioned publishing with:
//! - Partition affinity by key (all events for one key share a partition)
//! - JetStream for persistence and broker acknowledgment
//! - Bounded ack wait and broker-side retry with exponential backoff
//! - An in-memory bus for tests and local runs
//! - Observability via Prometheus metrics

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod jetstream;
pub mod memory;
pub mod metrics;
pub mod partitioning;
pub mod publisher;
pub mod types;

pub use config::PublisherConfig;
pub use error::{Error, Result};
pub use jetstream::JetStreamPublisher;
pub use memory::{InMemoryPublisher, PublishedRecord};
pub use partitioning::{HashPartitioning, PartitioningStrategy};
pub use publisher::{OrderedPublisher, PublishAck};
pub use types::{PartitionKey, Topic};
