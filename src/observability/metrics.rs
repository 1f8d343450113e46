//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pool_suppressions_total` (counter): backends taken out of rotation, by backend
//! - `pool_recoveries_total` (counter): backends returned to rotation, by backend
//! - `pool_full_resets_total` (counter): full resets of the availability set
//! - `pool_failovers_total` (counter): calls retried on another backend, by operation
//! - `pool_fanout_errors_total` (counter): per-backend failures in whole-pool operations
//! - `pool_backend_available` (gauge): 1=usable, 0=suppressed
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::net::SocketAddr;

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

pub fn record_suppression(backend: &str) {
    metrics::counter!("pool_suppressions_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_recovery(backend: &str) {
    metrics::counter!("pool_recoveries_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_full_reset() {
    metrics::counter!("pool_full_resets_total").increment(1);
}

pub fn record_failover(operation: &str) {
    metrics::counter!("pool_failovers_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_fanout_error(operation: &str) {
    metrics::counter!("pool_fanout_errors_total", "operation" => operation.to_string()).increment(1);
}

pub fn record_backend_available(backend: &str, available: bool) {
    metrics::gauge!("pool_backend_available", "backend" => backend.to_string())
        .set(if available { 1.0 } else { 0.0 });
}
