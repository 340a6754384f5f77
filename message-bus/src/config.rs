//! Publisher configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Publisher configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// NATS server URL
    pub nats_url: String,

    /// Number of partitions per topic
    pub num_partitions: u32,

    /// Stream replicas (JetStream)
    pub num_replicas: usize,

    /// Deadline for broker acknowledgment across all publish attempts (ms).
    /// Stream creation on first use is not counted.
    pub ack_timeout_ms: u64,

    /// Max publish attempts (broker client retry count + 1)
    pub max_retry_attempts: u32,

    /// Initial retry delay (ms)
    pub initial_retry_delay_ms: u64,

    /// Max retry delay (ms)
    pub max_retry_delay_ms: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
            num_partitions: 32,
            num_replicas: 1,
            ack_timeout_ms: 5_000,
            max_retry_attempts: 3,
            initial_retry_delay_ms: 100,
            max_retry_delay_ms: 2_000,
        }
    }
}

impl PublisherConfig {
    /// Per-attempt acknowledgment timeout
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    /// Initial retry delay
    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }

    /// Max retry delay
    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }

    /// Apply environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("NATS_URL") {
            self.nats_url = url;
        }

        if let Ok(value) = std::env::var("NATS_PUBLISH_TIMEOUT_MS") {
            self.ack_timeout_ms = value
                .parse()
                .map_err(|e| Error::Config(format!("NATS_PUBLISH_TIMEOUT_MS: {}", e)))?;
        }

        if let Ok(value) = std::env::var("NATS_PUBLISH_RETRIES") {
            self.max_retry_attempts = value
                .parse()
                .map_err(|e| Error::Config(format!("NATS_PUBLISH_RETRIES: {}", e)))?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.num_partitions == 0 {
            return Err(Error::Config("num_partitions must be > 0".to_string()));
        }
        if self.max_retry_attempts == 0 {
            return Err(Error::Config("max_retry_attempts must be >= 1".to_string()));
        }
        if self.ack_timeout_ms == 0 {
            return Err(Error::Config("ack_timeout_ms must be > 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publisher_config_default() {
        let config = PublisherConfig::default();
        assert_eq!(config.max_retry_attempts, 3);
        assert_eq!(config.ack_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PublisherConfig = toml::from_str("num_partitions = 8").unwrap();
        assert_eq!(config.num_partitions, 8);
        assert_eq!(config.max_retry_attempts, 3);
    }

    #[test]
    fn test_zero_partitions_rejected() {
        let config = PublisherConfig {
            num_partitions: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
