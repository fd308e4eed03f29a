//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define translation server metrics (requests, latency, connections)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `translation_requests_total` (counter): answered requests by route, status
//! - `translation_negotiations_total` (counter): follow-up questions by kind
//! - `translation_dispatch_duration_seconds` (histogram): time to answer
//! - `translation_connections_active` (gauge): current connection count
//! - `translation_framing_errors_total` (counter): connections closed on bad input
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op
//! - Labels are low cardinality: route names and status codes only

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// One answered request. Status 0 means no status packet was sent.
pub fn record_request(route: &'static str, status: Option<u16>) {
    let status = status.unwrap_or(0).to_string();
    ::metrics::counter!("translation_requests_total", "route" => route, "status" => status)
        .increment(1);
}

/// A negotiation-only answer (`WANT`, `WANT_FULL_URI`, probe tokens).
pub fn record_negotiation(kind: &'static str) {
    ::metrics::counter!("translation_negotiations_total", "kind" => kind).increment(1);
}

pub fn record_dispatch_duration(start: Instant) {
    ::metrics::histogram!("translation_dispatch_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_connection_opened() {
    ::metrics::gauge!("translation_connections_active").increment(1.0);
}

pub fn record_connection_closed() {
    ::metrics::gauge!("translation_connections_active").decrement(1.0);
}

pub fn record_framing_error() {
    ::metrics::counter!("translation_framing_errors_total").increment(1);
}
