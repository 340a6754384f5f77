//! Configuration for settlement optimization

use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settlement optimizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Batching configuration
    pub batching: BatchingConfig,

    /// Cost model configuration
    pub cost: CostConfig,

    /// Solver configuration
    pub solver: SolverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "settlement-optimizer".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            batching: BatchingConfig::default(),
            cost: CostConfig::default(),
            solver: SolverConfig::default(),
        }
    }
}

/// Batching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    /// Maximum transactions per optimization chunk
    pub max_batch_size: usize,

    /// Logical sub-batches per chunk
    pub sub_batches: usize,

    /// Maximum transactions in a fallback batch
    pub fallback_batch_size: usize,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 1000,
            sub_batches: 3,
            fallback_batch_size: 100,
        }
    }
}

/// Cost model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// Wire cost per transfer
    pub wire_cost: Decimal,

    /// Fractional wire cost reduction for consolidated transfers
    pub consolidation_discount: Decimal,

    /// Spread for currency pairs missing from the table (basis points)
    pub default_spread_bps: Decimal,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            wire_cost: Decimal::new(500, 2),             // 5.00
            consolidation_discount: Decimal::new(15, 2), // 15%
            default_spread_bps: Decimal::new(5, 0),
        }
    }
}

/// Solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum search nodes per solve
    pub max_nodes: u64,

    /// Wall-clock limit per solve in milliseconds (none = unbounded)
    pub time_limit_ms: Option<u64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_nodes: 1_000_000,
            time_limit_ms: Some(5_000),
        }
    }
}

impl SolverConfig {
    /// Time limit as duration
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides on top of the current values
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(size) = std::env::var("SETTLEMENT_MAX_BATCH_SIZE") {
            self.batching.max_batch_size = size
                .parse()
                .map_err(|e| Error::Config(format!("SETTLEMENT_MAX_BATCH_SIZE: {}", e)))?;
        }

        if let Ok(nodes) = std::env::var("SETTLEMENT_MAX_NODES") {
            self.solver.max_nodes = nodes
                .parse()
                .map_err(|e| Error::Config(format!("SETTLEMENT_MAX_NODES: {}", e)))?;
        }

        if let Ok(ms) = std::env::var("SETTLEMENT_SOLVER_TIME_LIMIT_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|e| Error::Config(format!("SETTLEMENT_SOLVER_TIME_LIMIT_MS: {}", e)))?;
            self.solver.time_limit_ms = (ms > 0).then_some(ms);
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.batching.max_batch_size == 0 {
            return Err(Error::Config("batching.max_batch_size must be > 0".to_string()));
        }
        if self.batching.sub_batches == 0 {
            return Err(Error::Config("batching.sub_batches must be > 0".to_string()));
        }
        if self.batching.fallback_batch_size == 0 {
            return Err(Error::Config(
                "batching.fallback_batch_size must be > 0".to_string(),
            ));
        }
        if self.cost.wire_cost < Decimal::ZERO {
            return Err(Error::Config("cost.wire_cost must be >= 0".to_string()));
        }
        if self.cost.consolidation_discount < Decimal::ZERO
            || self.cost.consolidation_discount >= Decimal::ONE
        {
            return Err(Error::Config(
                "cost.consolidation_discount must be in [0, 1)".to_string(),
            ));
        }
        if self.cost.default_spread_bps < Decimal::ZERO {
            return Err(Error::Config("cost.default_spread_bps must be >= 0".to_string()));
        }
        if self.solver.max_nodes == 0 {
            return Err(Error::Config("solver.max_nodes must be > 0".to_string()));
        }
        Ok(())
    }
}
