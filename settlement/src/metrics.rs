//! Prometheus metrics for batch optimization

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram, CounterVec, Histogram};

lazy_static! {
    /// Chunk optimizations by outcome (optimized, fallback, empty)
    pub static ref SETTLEMENT_OPTIMIZATION_TOTAL: CounterVec = register_counter_vec!(
        "settlement_optimization_total",
        "Chunk optimizations by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Chunk optimization duration
    pub static ref SETTLEMENT_OPTIMIZATION_DURATION: Histogram = register_histogram!(
        "settlement_optimization_duration_seconds",
        "Chunk optimization duration in seconds"
    )
    .unwrap();

    /// Search nodes per solve
    pub static ref SETTLEMENT_SOLVER_NODES: Histogram = register_histogram!(
        "settlement_solver_nodes",
        "Search nodes explored per solve",
        prometheus::exponential_buckets(1.0, 4.0, 12).unwrap()
    )
    .unwrap();
}

/// Count one chunk outcome
pub fn record_outcome(outcome: &str) {
    SETTLEMENT_OPTIMIZATION_TOTAL
        .with_label_values(&[outcome])
        .inc();
}
