//! Prometheus metrics for intake

use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram, CounterVec, Histogram};

lazy_static! {
    /// Submissions by outcome (accepted, duplicate, rejected, publish_failed)
    pub static ref INTAKE_SUBMISSIONS_TOTAL: CounterVec = register_counter_vec!(
        "intake_submissions_total",
        "Total transaction submissions by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Swallowed idempotency store failures
    pub static ref INTAKE_DEDUP_STORE_ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "intake_dedup_store_errors_total",
        "Idempotency store failures tolerated by the pipeline",
        &["operation"]
    )
    .unwrap();

    /// End-to-end submission latency
    pub static ref INTAKE_SUBMIT_DURATION: Histogram = register_histogram!(
        "intake_submit_duration_seconds",
        "Submission latency in seconds"
    )
    .unwrap();
}

/// Submission outcome label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// New transaction published
    Accepted,
    /// Replayed from the idempotency store
    Duplicate,
    /// Failed business validation
    Rejected,
    /// Publish failed or timed out
    PublishFailed,
}

impl Outcome {
    fn label(self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Duplicate => "duplicate",
            Outcome::Rejected => "rejected",
            Outcome::PublishFailed => "publish_failed",
        }
    }
}

/// Count one submission
pub fn record_submission(outcome: Outcome) {
    INTAKE_SUBMISSIONS_TOTAL
        .with_label_values(&[outcome.label()])
        .inc();
}

/// Count one tolerated store failure
pub fn record_store_error(operation: &str) {
    INTAKE_DEDUP_STORE_ERRORS_TOTAL
        .with_label_values(&[operation])
        .inc();
}
