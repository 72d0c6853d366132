//! Metrics collection and exposition.
//!
//! # Metrics
//! - `restyle_requests_total` (counter): requests by endpoint, status
//! - `restyle_request_duration_seconds` (histogram): latency by endpoint
//! - `restyle_upstream_bytes_total` (counter): fetched bytes by content kind

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(endpoint: &'static str, status: u16, start: Instant) {
    counter!("restyle_requests_total", "endpoint" => endpoint, "status" => status.to_string()).increment(1);
    histogram!("restyle_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_bytes(kind: &'static str, bytes: usize) {
    counter!("restyle_upstream_bytes_total", "kind" => kind).increment(bytes as u64);
}
