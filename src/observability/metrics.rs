//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): upstream calls by target, outcome
//! - `relay_request_duration_seconds` (histogram): upstream latency by target
//! - `rate_limited_total` (counter): requests rejected by the rate limiter
//! - `workflow_creations_total` (counter): workflow API calls by outcome
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus
//! recorder, so callers never check whether metrics are enabled.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_relay_call(target: &str, outcome: &'static str, start: Instant) {
    counter!("relay_requests_total", "target" => target.to_string(), "outcome" => outcome).increment(1);
    histogram!("relay_request_duration_seconds", "target" => target.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    counter!("rate_limited_total").increment(1);
}

pub fn record_workflow_creation(outcome: &'static str) {
    counter!("workflow_creations_total", "outcome" => outcome).increment(1);
}
