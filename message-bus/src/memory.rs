//! In-memory ordered publisher
//!
//! Keeps every record in publish order and supports injected failures, so the
//! intake pipeline can be exercised without a broker.

use crate::{
    metrics,
    partitioning::{HashPartitioning, PartitioningStrategy},
    publisher::{OrderedPublisher, PublishAck},
    types::{PartitionKey, Topic},
    Error, Result,
};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::time::Instant;

/// Record captured by [`InMemoryPublisher`]
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedRecord {
    /// Topic
    pub topic: Topic,
    /// Partition the key mapped to
    pub partition: u32,
    /// Partition key
    pub key: PartitionKey,
    /// Payload bytes
    pub payload: Bytes,
    /// Sequence number (global, starting at 1)
    pub sequence: u64,
}

#[derive(Debug, Default)]
struct State {
    records: Vec<PublishedRecord>,
    failures_remaining: u32,
    unavailable: bool,
    flushes: u32,
}

/// In-memory publisher
#[derive(Debug)]
pub struct InMemoryPublisher {
    partitioning: HashPartitioning,
    state: Mutex<State>,
}

impl Default for InMemoryPublisher {
    fn default() -> Self {
        Self::new(32)
    }
}

impl InMemoryPublisher {
    /// Create publisher with given partition count
    pub fn new(num_partitions: u32) -> Self {
        Self {
            partitioning: HashPartitioning::new(num_partitions),
            state: Mutex::new(State::default()),
        }
    }

    /// Fail the next `count` publishes
    pub fn fail_next(&self, count: u32) {
        self.state.lock().failures_remaining = count;
    }

    /// Fail every publish until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// All records in publish order
    pub fn records(&self) -> Vec<PublishedRecord> {
        self.state.lock().records.clone()
    }

    /// Records of one partition in publish order
    pub fn partition_log(&self, topic: Topic, partition: u32) -> Vec<PublishedRecord> {
        self.state
            .lock()
            .records
            .iter()
            .filter(|r| r.topic == topic && r.partition == partition)
            .cloned()
            .collect()
    }

    /// Number of flush calls
    pub fn flush_count(&self) -> u32 {
        self.state.lock().flushes
    }
}

#[async_trait]
impl OrderedPublisher for InMemoryPublisher {
    async fn publish(&self, topic: Topic, key: &PartitionKey, payload: Bytes) -> Result<PublishAck> {
        let start = Instant::now();

        let result = {
            let mut state = self.state.lock();
            if state.unavailable {
                Err(Error::Publish("broker unavailable".to_string()))
            } else if state.failures_remaining > 0 {
                state.failures_remaining -= 1;
                Err(Error::Publish("injected failure".to_string()))
            } else {
                let partition = self.partitioning.partition(key);
                let sequence = state.records.len() as u64 + 1;
                state.records.push(PublishedRecord {
                    topic,
                    partition,
                    key: key.clone(),
                    payload,
                    sequence,
                });
                Ok(PublishAck {
                    topic,
                    partition,
                    sequence,
                })
            }
        };

        metrics::record_publish(topic, result.is_ok(), start.elapsed());
        result
    }

    async fn flush(&self) -> Result<()> {
        self.state.lock().flushes += 1;
        Ok(())
    }
}
