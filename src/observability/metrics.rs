//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_exchanges_total` (counter): exchanges by outcome
//! - `relay_exchange_duration_seconds` (histogram): latency by outcome
//! - `relay_gateway_connections_open` (gauge): open connections per gateway
//! - `relay_gateway_connects_total` (counter): connect attempts per gateway and result
//!
//! Without an installed recorder these calls are no-ops.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished exchange.
pub fn record_exchange(outcome: &'static str, start: Instant) {
    counter!("relay_exchanges_total", "outcome" => outcome).increment(1);
    histogram!("relay_exchange_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn connection_opened(gateway: &str) {
    gauge!("relay_gateway_connections_open", "gateway" => gateway.to_string()).increment(1.0);
}

pub fn connection_closed(gateway: &str) {
    gauge!("relay_gateway_connections_open", "gateway" => gateway.to_string()).decrement(1.0);
}

pub fn connect_attempt(gateway: &str, result: &'static str) {
    counter!("relay_gateway_connects_total", "gateway" => gateway.to_string(), "result" => result)
        .increment(1);
}
