//! Metrics collection and exposition.
//!
//! # Metrics
//! - `passerelle_requests_total` (counter): inbound requests by method, route, status
//! - `passerelle_request_duration_seconds` (histogram): inbound latency by route
//! - `passerelle_upstream_requests_total` (counter): outbound calls by connector, outcome
//! - `passerelle_upstream_duration_seconds` (histogram): outbound latency by connector
//!
//! Recording is a no-op until a recorder is installed, so handlers and
//! tests can call these freely.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record an inbound request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "passerelle_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "passerelle_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record an outbound call to a wrapped API.
pub fn record_upstream(connector: &str, outcome: &'static str, start: Instant) {
    metrics::counter!(
        "passerelle_upstream_requests_total",
        "connector" => connector.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "passerelle_upstream_duration_seconds",
        "connector" => connector.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
