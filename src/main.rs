//! db-cluster-pool
//!
//! Command-line front end for the cluster pool.
//!
//! # Architecture Overview
//!
//! ```text
//!   pool.toml ──▶ config ──▶ ClusterPool::from_config ──▶ TcpBackend per host
//!                                   │
//!                ┌──────────────────┼──────────────────┐
//!                ▼                  ▼                  ▼
//!          availability         dispatcher          fan-out
//!            tracker          (failover loop)    (whole-pool ops)
//!                ▲
//!                │ health_sweep every interval
//!          HealthMonitor ── gauges ──▶ Prometheus exporter
//! ```
//!
//! # Commands
//! - `check`: validate the config and print the resolved backends
//! - `status`: connect once, sweep, print the pool status
//! - `watch`: keep the pool under the health monitor until SIGINT/SIGTERM

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::json;

use db_cluster_pool::backend::tcp::TcpBackendFactory;
use db_cluster_pool::config::{load_config, PoolConfig};
use db_cluster_pool::health::HealthMonitor;
use db_cluster_pool::lifecycle::{signals, Shutdown};
use db_cluster_pool::observability::{logging, metrics, TracingObserver};
use db_cluster_pool::ClusterPool;

#[derive(Parser)]
#[command(name = "db-cluster-pool")]
#[command(about = "Weighted, failover-aware database connection pool", long_about = None)]
struct Cli {
    /// Pool configuration file.
    #[arg(short, long, default_value = "pool.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and print the resolved backends
    Check,
    /// Connect to every backend and print the pool status
    Status,
    /// Run the health monitor until interrupted
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!(config = %cli.config.display(), backends = config.backends.len(), "Configuration loaded");

    match cli.command {
        Commands::Check => check(&config)?,
        Commands::Status => status(config).await?,
        Commands::Watch => watch(config).await?,
    }

    Ok(())
}

fn check(config: &PoolConfig) -> Result<(), Box<dyn std::error::Error>> {
    let descriptors = config.descriptors()?;
    let total: u64 = descriptors.iter().map(|d| u64::from(d.weight)).sum();

    let backends: Vec<_> = descriptors
        .iter()
        .map(|d| {
            json!({
                "name": d.name,
                "adapter": d.adapter,
                "url": d.url.as_str(),
                "weight": d.weight,
                "share": if total == 0 { 0.0 } else { f64::from(d.weight) / total as f64 },
                "connect_timeout_secs": d.connect_timeout.as_secs(),
                "primary": d.primary,
            })
        })
        .collect();

    let report = json!({
        "suppression_ttl_ms": config.pool.suppression_ttl_ms,
        "total_weight": total,
        "backends": backends,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn connect(config: PoolConfig) -> Result<Arc<ClusterPool>, Box<dyn std::error::Error>> {
    let pool = tokio::task::spawn_blocking(move || {
        ClusterPool::from_config(&config, &TcpBackendFactory, Arc::new(TracingObserver))
    })
    .await??;
    Ok(Arc::new(pool))
}

async fn status(config: PoolConfig) -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect(config).await?;

    let report = tokio::task::spawn_blocking(move || {
        pool.health_sweep();
        json!({
            "all_active": pool.active_check(),
            "status": pool.status(),
        })
    })
    .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn watch(config: PoolConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let health_config = config.health_check.clone();
    let pool = connect(config).await?;

    let shutdown = Shutdown::new();
    let monitor = HealthMonitor::new(pool.clone(), health_config);
    let monitor_task = tokio::spawn(monitor.run(shutdown.subscribe()));

    signals::shutdown_on_signal(shutdown.clone()).await;

    if let Err(e) = monitor_task.await {
        tracing::error!(error = %e, "Health monitor task failed");
    }
    shutdown.drained(Duration::from_secs(5)).await;

    let report = tokio::task::spawn_blocking(move || pool.disconnect_all()).await?;
    if !report.is_clean() {
        tracing::warn!(failures = report.failures.len(), "Some backends failed to disconnect");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
