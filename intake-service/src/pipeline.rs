//! Intake pipeline: validate, deduplicate, store, publish

use crate::{
    config::Config,
    dedup::dedup_key,
    metrics::{self, Outcome},
    store::IdempotencyStore,
    validation::TransactionValidator,
    Result,
};
use bytes::Bytes;
use message_bus::{OrderedPublisher, PartitionKey, Topic};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use transaction_core::{TransactionId, TransactionRequest, TransactionResponse, TransactionStatus};

/// Transaction intake pipeline
///
/// Store and publisher handles are injected at construction. The store step is
/// best effort; the publish step is fatal.
pub struct IntakePipeline {
    store: Arc<dyn IdempotencyStore>,
    publisher: Arc<dyn OrderedPublisher>,
    validator: TransactionValidator,
    config: Config,
}

impl std::fmt::Debug for IntakePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakePipeline")
            .field("service_name", &self.config.service_name)
            .field("atomic_dedup", &self.config.dedup.atomic)
            .finish_non_exhaustive()
    }
}

impl IntakePipeline {
    /// Create pipeline
    pub fn new(
        store: Arc<dyn IdempotencyStore>,
        publisher: Arc<dyn OrderedPublisher>,
        config: Config,
    ) -> Self {
        let validator = TransactionValidator::new(config.limits.clone());
        Self {
            store,
            publisher,
            validator,
            config,
        }
    }

    /// Pipeline configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Submit a transaction
    ///
    /// Returns the response and whether it was replayed from the idempotency store.
    pub async fn submit(&self, request: TransactionRequest) -> Result<(TransactionResponse, bool)> {
        let start = Instant::now();
        let result = self.process(request).await;
        metrics::INTAKE_SUBMIT_DURATION.observe(start.elapsed().as_secs_f64());
        result
    }

    async fn process(&self, request: TransactionRequest) -> Result<(TransactionResponse, bool)> {
        if let Err(e) = self.validator.validate(&request) {
            warn!("Transaction {} rejected: {}", request.transaction_id, e);
            metrics::record_submission(Outcome::Rejected);
            return Err(e.into());
        }

        let key = dedup_key(&self.config.dedup.key_prefix, &request.idempotency_key);

        if let Some(existing) = self.check_duplicate(&key).await {
            info!(
                "Duplicate submission for transaction {} (original {})",
                request.transaction_id,
                existing.transaction_id()
            );
            metrics::record_submission(Outcome::Duplicate);
            return Ok((existing, true));
        }

        let response = TransactionResponse::submitted(request);
        let payload = serde_json::to_string(&response)?;

        if self.config.dedup.atomic {
            if let Some(winner) = self.claim(&key, &payload).await {
                info!(
                    "Concurrent duplicate for transaction {} (original {})",
                    response.transaction_id(),
                    winner.transaction_id()
                );
                metrics::record_submission(Outcome::Duplicate);
                return Ok((winner, true));
            }
        } else {
            self.remember(&key, &payload).await;
        }

        let partition_key = PartitionKey::new(response.transaction_id().as_str());
        match self
            .publisher
            .publish(Topic::TransactionIntake, &partition_key, Bytes::from(payload))
            .await
        {
            Ok(ack) => {
                info!(
                    "Transaction {} accepted (partition {}, sequence {})",
                    response.transaction_id(),
                    ack.partition,
                    ack.sequence
                );
                metrics::record_submission(Outcome::Accepted);
                Ok((response, false))
            }
            Err(e) => {
                error!(
                    "Failed to publish transaction {}: {}",
                    response.transaction_id(),
                    e
                );
                metrics::record_submission(Outcome::PublishFailed);
                if self.config.dedup.release_on_publish_failure {
                    self.release(&key).await;
                }
                Err(e.into())
            }
        }
    }

    /// Look up a stored response; any failure counts as a miss
    async fn check_duplicate(&self, key: &str) -> Option<TransactionResponse> {
        let cached = match self.store.get(key).await {
            Ok(cached) => cached?,
            Err(e) => {
                error!("Idempotency store read failed for {}: {}", key, e);
                metrics::record_store_error("get");
                return None;
            }
        };

        match serde_json::from_str(&cached) {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("Discarding unreadable dedup entry {}: {}", key, e);
                None
            }
        }
    }

    async fn remember(&self, key: &str, payload: &str) {
        match self.store.set(key, payload, self.config.dedup.ttl()).await {
            Ok(()) => debug!("Stored dedup entry {}", key),
            Err(e) => {
                error!("Idempotency store write failed for {}: {}", key, e);
                metrics::record_store_error("set");
            }
        }
    }

    /// Claim the key with set-if-absent; returns the winner's response when the claim is lost
    async fn claim(&self, key: &str, payload: &str) -> Option<TransactionResponse> {
        match self
            .store
            .set_if_absent(key, payload, self.config.dedup.ttl())
            .await
        {
            Ok(true) => {
                debug!("Claimed dedup entry {}", key);
                None
            }
            Ok(false) => self.check_duplicate(key).await,
            Err(e) => {
                error!("Idempotency store claim failed for {}: {}", key, e);
                metrics::record_store_error("set_if_absent");
                None
            }
        }
    }

    async fn release(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            error!("Failed to release dedup entry {}: {}", key, e);
            metrics::record_store_error("remove");
        }
    }

    /// Status lookup hook
    ///
    /// Always `None`: transaction state lives in downstream storage.
    pub fn transaction_status(&self, transaction_id: &TransactionId) -> Option<TransactionStatus> {
        debug!(
            "Status lookup for {} not served by intake",
            transaction_id
        );
        None
    }

    /// Flush the publisher and release the pipeline
    pub async fn shutdown(self) -> Result<()> {
        info!("Shutting down {}", self.config.service_name);
        self.publisher.flush().await?;
        Ok(())
    }
}
