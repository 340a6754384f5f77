//! Type definitions for message bus

use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic a record is published on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// Accepted transactions from intake
    TransactionIntake,
    /// Optimized settlement batches
    SettlementBatches,
}

impl Topic {
    /// Topic name (also the NATS subject prefix)
    pub fn name(&self) -> &'static str {
        match self {
            Topic::TransactionIntake => "transactions.intake",
            Topic::SettlementBatches => "settlement.batches",
        }
    }

    /// Get JetStream stream name for this topic
    pub fn stream_name(&self) -> &'static str {
        match self {
            Topic::TransactionIntake => "TRANSACTIONS_INTAKE",
            Topic::SettlementBatches => "SETTLEMENT_BATCHES",
        }
    }

    /// NATS subject for one partition of this topic
    pub fn partition_subject(&self, partition: u32) -> String {
        format!("{}.p{}", self.name(), partition)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Partition key for routing records
///
/// Records sharing a key always land on the same partition, so a single consumer
/// of that partition observes them in publish order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey(String);

impl PartitionKey {
    /// Create partition key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compute partition number for load balancing
    pub fn partition_number(&self, num_partitions: u32) -> u32 {
        let hash = blake3::hash(self.0.as_bytes());
        let hash_bytes = hash.as_bytes();
        let hash_u32 =
            u32::from_le_bytes([hash_bytes[0], hash_bytes[1], hash_bytes[2], hash_bytes[3]]);
        hash_u32 % num_partitions
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
