//! Client metrics collection.
//!
//! - Request counters by operation and status
//! - Latency histograms

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total API requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "musicai_client_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "musicai_client_latency_seconds";

    /// Poll errors tolerated by a retry policy.
    pub const POLL_ERRORS_TOTAL: &str = "musicai_client_poll_errors_total";
}

/// Record metrics for a completed request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record a poll error that was retried instead of propagated.
pub fn record_poll_error() {
    counter!(names::POLL_ERRORS_TOTAL).increment(1);
}
