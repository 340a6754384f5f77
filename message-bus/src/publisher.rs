//! Ordered publisher boundary

use crate::{
    types::{PartitionKey, Topic},
    Result,
};
use async_trait::async_trait;
use bytes::Bytes;

/// Broker acknowledgment for one published record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishAck {
    /// Topic the record was written to
    pub topic: Topic,

    /// Partition the key mapped to
    pub partition: u32,

    /// Broker sequence number
    pub sequence: u64,
}

/// Ordered, partitioned, append-only log
///
/// Records published with the same partition key are appended to the same
/// partition in call order. Delivery is at-least-once.
#[async_trait]
pub trait OrderedPublisher: Send + Sync {
    /// Publish one record and wait for the broker acknowledgment
    async fn publish(&self, topic: Topic, key: &PartitionKey, payload: Bytes) -> Result<PublishAck>;

    /// Flush any buffered records
    async fn flush(&self) -> Result<()>;
}
