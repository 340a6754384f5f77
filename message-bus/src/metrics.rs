//! Prometheus metrics for message bus

use crate::types::Topic;
use lazy_static::lazy_static;
use prometheus::{register_counter_vec, register_histogram_vec, CounterVec, HistogramVec};
use std::time::Duration;

lazy_static! {
    /// Total records published
    pub static ref MESSAGE_PUBLISH_TOTAL: CounterVec = register_counter_vec!(
        "message_bus_publish_total",
        "Total records published",
        &["topic", "status"]
    )
    .unwrap();

    /// Record publish duration
    pub static ref MESSAGE_PUBLISH_DURATION: HistogramVec = register_histogram_vec!(
        "message_bus_publish_duration_seconds",
        "Record publish duration in seconds",
        &["topic"]
    )
    .unwrap();
}

/// Record the outcome of one publish call
pub fn record_publish(topic: Topic, success: bool, elapsed: Duration) {
    MESSAGE_PUBLISH_DURATION
        .with_label_values(&[topic.name()])
        .observe(elapsed.as_secs_f64());

    let status = if success { "success" } else { "error" };
    MESSAGE_PUBLISH_TOTAL
        .with_label_values(&[topic.name(), status])
        .inc();
}
