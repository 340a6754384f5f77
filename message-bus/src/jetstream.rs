//! JetStream publisher
//!
//! One persistent stream per topic, one subject per partition
//! (`<topic>.p<partition>`). A record's partition is derived from its key, so a
//! single subject carries every record for that key in publish order.

use crate::{
    config::PublisherConfig,
    metrics,
    partitioning::{HashPartitioning, PartitioningStrategy},
    publisher::{OrderedPublisher, PublishAck},
    types::{PartitionKey, Topic},
    Error, Result,
};
use async_nats::jetstream::{
    stream::{Config as StreamConfig, RetentionPolicy, StorageType},
    Context as JetStreamContext,
};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// JetStream-backed ordered publisher
pub struct JetStreamPublisher {
    client: async_nats::Client,
    context: JetStreamContext,
    partitioning: HashPartitioning,
    config: PublisherConfig,
    ready_streams: Mutex<HashSet<Topic>>,
}

impl std::fmt::Debug for JetStreamPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JetStreamPublisher")
            .field("nats_url", &self.config.nats_url)
            .field("partitioning", &self.partitioning)
            .finish()
    }
}

impl JetStreamPublisher {
    /// Connect to NATS and create the JetStream context
    pub async fn connect(config: PublisherConfig) -> Result<Self> {
        config.validate()?;

        info!("Connecting to NATS JetStream at {}", config.nats_url);

        let client = async_nats::connect(config.nats_url.as_str())
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let context = async_nats::jetstream::new(client.clone());

        Ok(Self {
            client,
            context,
            partitioning: HashPartitioning::new(config.num_partitions),
            config,
            ready_streams: Mutex::new(HashSet::new()),
        })
    }

    /// Create the topic's stream on first use
    async fn ensure_stream(&self, topic: Topic) -> Result<()> {
        if self.ready_streams.lock().contains(&topic) {
            return Ok(());
        }

        let stream_config = StreamConfig {
            name: topic.stream_name().to_string(),
            description: Some(format!("Partitioned log for {}", topic)),
            subjects: vec![format!("{}.>", topic.name())],
            retention: RetentionPolicy::Limits,
            max_age: Duration::from_secs(7 * 24 * 3600), // 7 days
            storage: StorageType::File,
            num_replicas: self.config.num_replicas,
            ..Default::default()
        };

        self.context
            .get_or_create_stream(stream_config)
            .await
            .map_err(|e| {
                error!("Failed to create stream {}: {}", topic.stream_name(), e);
                Error::StreamCreation(e.to_string())
            })?;

        self.ready_streams.lock().insert(topic);
        info!("Stream {} ready", topic.stream_name());
        Ok(())
    }

    /// Single publish attempt, waiting for the broker ack
    async fn publish_once(&self, subject: &str, key: &PartitionKey, payload: Bytes) -> Result<u64> {
        let headers = record_headers(key);

        let ack = self
            .context
            .publish_with_headers(subject.to_string(), headers, payload)
            .await
            .map_err(|e| Error::Publish(e.to_string()))?
            .await
            .map_err(|e| Error::Publish(format!("Publish ack failed: {}", e)))?;

        Ok(ack.sequence)
    }

    /// Publish with exponential backoff retry, bounded by the ack timeout overall
    async fn publish_with_retry(
        &self,
        subject: &str,
        key: &PartitionKey,
        payload: Bytes,
    ) -> Result<u64> {
        let timeout = self.config.ack_timeout();
        let deadline = Instant::now() + timeout;
        let mut attempts = 0;
        let mut delay = self.config.initial_retry_delay();

        loop {
            attempts += 1;

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                error!("Publish to {} timed out after {} attempts", subject, attempts - 1);
                return Err(Error::Timeout(timeout.as_millis() as u64));
            }

            match tokio::time::timeout(remaining, self.publish_once(subject, key, payload.clone()))
                .await
            {
                Ok(Ok(sequence)) => {
                    if attempts > 1 {
                        info!("Record published to {} after {} attempts", subject, attempts);
                    }
                    return Ok(sequence);
                }
                Ok(Err(e)) => {
                    if attempts >= self.config.max_retry_attempts {
                        error!("Failed to publish after {} attempts: {}", attempts, e);
                        return Err(e);
                    }

                    warn!(
                        "Publish failed (attempt {}), retrying in {:?}: {}",
                        attempts, delay, e
                    );
                    tokio::time::sleep(delay.min(remaining)).await;

                    // Exponential backoff
                    delay = (delay * 2).min(self.config.max_retry_delay());
                }
                Err(_) => {
                    error!("Publish to {} timed out waiting for ack", subject);
                    return Err(Error::Timeout(timeout.as_millis() as u64));
                }
            }
        }
    }
}

/// Record headers
///
/// `Nats-Msg-Id` carries the record key, so the stream drops a retry whose
/// earlier attempt was persisted but never acknowledged.
fn record_headers(key: &PartitionKey) -> async_nats::HeaderMap {
    let mut headers = async_nats::HeaderMap::new();
    headers.insert("Nats-Msg-Id", key.as_str());
    headers.insert("Partition-Key", key.as_str());
    headers
}

#[async_trait]
impl OrderedPublisher for JetStreamPublisher {
    async fn publish(&self, topic: Topic, key: &PartitionKey, payload: Bytes) -> Result<PublishAck> {
        let start = std::time::Instant::now();

        let result: Result<PublishAck> = async {
            self.ensure_stream(topic).await?;

            let partition = self.partitioning.partition(key);
            let subject = topic.partition_subject(partition);
            let sequence = self.publish_with_retry(&subject, key, payload).await?;

            debug!(
                "Published {} to {} partition {} sequence {}",
                key, topic, partition, sequence
            );

            Ok(PublishAck {
                topic,
                partition,
                sequence,
            })
        }
        .await;

        metrics::record_publish(topic, result.is_ok(), start.elapsed());
        result
    }

    async fn flush(&self) -> Result<()> {
        self.client
            .flush()
            .await
            .map_err(|e| Error::Flush(e.to_string()))?;
        info!("NATS publisher flushed");
        Ok(())
    }
}
