//! Active health checking.
//!
//! # Responsibilities
//! - Periodically sweep the pool on the blocking thread pool
//! - Publish per-backend availability gauges

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::observability::metrics;
use crate::pool::ClusterPool;

pub struct HealthMonitor {
    pool: Arc<ClusterPool>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(pool: Arc<ClusterPool>, config: HealthCheckConfig) -> Self {
        Self { pool, config }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(interval = self.config.interval_secs, "Health monitor starting");

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// One sweep. Backend probes block, so they run off the async workers.
    pub async fn check_all(&self) {
        let pool = self.pool.clone();
        let swept = tokio::task::spawn_blocking(move || {
            let suppressed = pool.health_sweep();
            (suppressed, pool.status())
        })
        .await;

        let (suppressed, status) = match swept {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Health sweep panicked");
                return;
            }
        };

        for backend in &suppressed {
            tracing::warn!(backend = %backend, "Health check failed: connection inactive");
        }
        for backend in &status.backends {
            metrics::record_backend_available(backend.name.as_str(), backend.usable);
        }
        tracing::debug!(
            usable = status.usable,
            suppressed = status.suppressed,
            current_primary = %status.current_primary,
            "Health sweep complete"
        );
    }
}
