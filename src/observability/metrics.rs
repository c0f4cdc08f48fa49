//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mock_requests_total` (counter): requests by route and status
//! - `mock_request_duration_seconds` (histogram): latency including artificial delay
//! - `mock_materializations_total` (counter): content drains by outcome
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op, so library code records unconditionally
//! - Prometheus exposition is opt-in via configuration

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a served request.
pub fn record_request(route: &str, status: u16, start: Instant) {
    let labels = [
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    counter!("mock_requests_total", &labels).increment(1);
    histogram!("mock_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Record the outcome of draining a content stream.
pub fn record_materialization(outcome: &'static str) {
    counter!("mock_materializations_total", "outcome" => outcome).increment(1);
}
