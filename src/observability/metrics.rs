//! Metrics collection and exposition.
//!
//! # Metrics
//! - `macgate_requests_total` (counter): datagrams received
//! - `macgate_requests_malformed_total` (counter): unparseable datagrams and
//!   requests missing required attributes
//! - `macgate_requests_dropped_total` (counter): datagrams shed at the
//!   in-flight limit
//! - `macgate_decisions_total` (counter): decisions labelled by outcome
//!   (`accept`, `unknown_device`, `network_not_authorized`, ...)

use std::net::SocketAddr;

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
///
/// Failure to install is logged, not fatal; the responder keeps serving
/// without the endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_counters();
            tracing::info!(address = %addr, "metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "failed to install metrics exporter");
        }
    }
}

fn describe_counters() {
    describe_counter!("macgate_requests_total", "Datagrams received on the RADIUS socket");
    describe_counter!(
        "macgate_requests_malformed_total",
        "Datagrams that could not be parsed or lacked required attributes"
    );
    describe_counter!(
        "macgate_requests_dropped_total",
        "Datagrams shed because the in-flight limit was reached"
    );
    describe_counter!(
        "macgate_decisions_total",
        "Access decisions by outcome label"
    );
}
