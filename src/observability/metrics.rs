//! Metrics collection and exposition.
//!
//! # Metrics
//! - `default_backend_outcomes_total` (counter): requests by outcome
//! - `default_backend_lookup_duration_seconds` (histogram): existence lookup latency
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one routed request.
pub fn record_outcome(outcome: &'static str) {
    counter!("default_backend_outcomes_total", "outcome" => outcome).increment(1);
}

/// Record how long an existence lookup took.
pub fn record_lookup(backend: &'static str, started: Instant) {
    histogram!("default_backend_lookup_duration_seconds", "backend" => backend)
        .record(started.elapsed().as_secs_f64());
}
