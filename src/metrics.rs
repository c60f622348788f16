//! Prometheus metrics for the dashboard client.
//!
//! This module provides metrics for:
//! - Backend HTTP request latency per endpoint
//! - Opportunity polling outcomes
//! - Execution requests and their results
//! - Forced logouts

use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Completed opportunity polls.
pub const METRIC_POLLS: &str = "opportunity_polls_total";
/// Failed opportunity polls.
pub const METRIC_POLL_FAILURES: &str = "opportunity_poll_failures_total";
/// Opportunities in the latest successful poll.
pub const METRIC_OPPORTUNITIES_VISIBLE: &str = "opportunities_visible";
/// Execute requests sent.
pub const METRIC_EXECUTIONS_REQUESTED: &str = "executions_requested_total";
/// Execute requests the backend accepted.
pub const METRIC_EXECUTIONS_STARTED: &str = "executions_started_total";
/// Execute requests that failed or were rejected.
pub const METRIC_EXECUTIONS_FAILED: &str = "executions_failed_total";
/// 401 responses that forced a logout.
pub const METRIC_UNAUTHORIZED: &str = "unauthorized_responses_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "Backend HTTP request latency in milliseconds"
    );
    describe_counter!(METRIC_POLLS, "Total number of opportunity polls");
    describe_counter!(
        METRIC_POLL_FAILURES,
        "Total number of opportunity polls that failed"
    );
    describe_gauge!(
        METRIC_OPPORTUNITIES_VISIBLE,
        "Opportunities returned by the latest successful poll"
    );
    describe_counter!(
        METRIC_EXECUTIONS_REQUESTED,
        "Total number of execute requests sent"
    );
    describe_counter!(
        METRIC_EXECUTIONS_STARTED,
        "Total number of executions the backend started"
    );
    describe_counter!(
        METRIC_EXECUTIONS_FAILED,
        "Total number of execute requests that failed or were rejected"
    );
    describe_counter!(
        METRIC_UNAUTHORIZED,
        "Total number of 401 responses that forced a logout"
    );

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder and return a handle for rendering.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Record a successful poll and the number of opportunities it returned.
pub fn record_poll(count: usize) {
    counter!(METRIC_POLLS).increment(1);
    gauge!(METRIC_OPPORTUNITIES_VISIBLE).set(count as f64);
}

/// Increment failed poll counter.
pub fn inc_poll_failures() {
    counter!(METRIC_POLL_FAILURES).increment(1);
}

/// Increment execute requests counter.
pub fn inc_executions_requested() {
    counter!(METRIC_EXECUTIONS_REQUESTED).increment(1);
}

/// Increment started executions counter.
pub fn inc_executions_started() {
    counter!(METRIC_EXECUTIONS_STARTED).increment(1);
}

/// Increment failed executions counter.
pub fn inc_executions_failed() {
    counter!(METRIC_EXECUTIONS_FAILED).increment(1);
}

/// Increment unauthorized responses counter.
pub fn inc_unauthorized() {
    counter!(METRIC_UNAUTHORIZED).increment(1);
}

/// RAII guard for timing backend requests.
/// Records latency for its endpoint when dropped.
pub struct LatencyTimer {
    start: Instant,
    endpoint: String,
}

impl LatencyTimer {
    /// Start timing a request to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.into(),
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_http_latency(self.start, &self.endpoint);
    }
}
