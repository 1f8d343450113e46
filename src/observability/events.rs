//! Pool events and the observer seam.
//!
//! The pool never logs directly from its state machine; it emits a
//! [`PoolEvent`] to the observer injected at construction.

use std::fmt;
use std::time::Duration;

use crate::backend::{BackendError, BackendId};
use crate::observability::metrics;

/// Something observable happened inside the pool.
#[derive(Debug, Clone, PartialEq)]
pub enum PoolEvent {
    /// A backend was taken out of rotation.
    Suppressed { backend: BackendId, ttl: Duration },
    /// A suppressed backend's window expired and a reconnect is being tried.
    ReconnectAttempt { backend: BackendId },
    /// A suppressed backend reconnected and is usable again.
    Recovered { backend: BackendId },
    /// A reconnect attempt failed; the backend stays suppressed.
    ReconnectFailed { backend: BackendId, error: BackendError, retry_in: Duration },
    /// Every non-primary backend was suppressed; all were retried at once.
    FullReset { backends: usize },
    /// The current primary pointer moved.
    PrimaryChanged { from: BackendId, to: BackendId },
    /// A call was retried on another backend after a connectivity failure.
    Failover { operation: String, from: BackendId, to: BackendId },
    /// One backend failed during a whole-pool operation.
    FanOutError { operation: String, backend: BackendId, error: BackendError },
}

/// Receives pool events.
pub trait PoolObserver: Send + Sync + fmt::Debug {
    fn on_event(&self, event: &PoolEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PoolObserver for NoopObserver {
    fn on_event(&self, _event: &PoolEvent) {}
}

/// Logs events with `tracing` and records them as metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PoolObserver for TracingObserver {
    fn on_event(&self, event: &PoolEvent) {
        match event {
            PoolEvent::Suppressed { backend, ttl } => {
                tracing::info!(backend = %backend, ttl = ?ttl, "Suppressing database connection from the pool");
                metrics::record_suppression(backend.as_str());
                metrics::record_backend_available(backend.as_str(), false);
            }
            PoolEvent::ReconnectAttempt { backend } => {
                tracing::info!(backend = %backend, "Adding dead database connection back to the pool");
            }
            PoolEvent::Recovered { backend } => {
                tracing::info!(backend = %backend, "Database connection recovered");
                metrics::record_recovery(backend.as_str());
                metrics::record_backend_available(backend.as_str(), true);
            }
            PoolEvent::ReconnectFailed { backend, error, retry_in } => {
                tracing::warn!(
                    backend = %backend,
                    error = %error,
                    retry_in = ?retry_in,
                    "Failed to reconnect to database when adding connection back to the pool"
                );
            }
            PoolEvent::FullReset { backends } => {
                tracing::warn!(backends, "All secondary connections suppressed, retrying every backend");
                metrics::record_full_reset();
            }
            PoolEvent::PrimaryChanged { from, to } => {
                tracing::info!(from = %from, to = %to, "New primary connection selected");
            }
            PoolEvent::Failover { operation, from, to } => {
                tracing::warn!(operation = %operation, from = %from, to = %to, "Retrying operation on another backend");
                metrics::record_failover(operation);
            }
            PoolEvent::FanOutError { operation, backend, error } => {
                tracing::warn!(operation = %operation, backend = %backend, error = %error, "Error in whole-pool operation");
                metrics::record_fanout_error(operation);
            }
        }
    }
}
