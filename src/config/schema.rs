//! Configuration schema definitions.
//!
//! This module defines the configuration structure for a cluster pool.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::backend::BackendId;
use crate::config::validation::ValidationError;

/// Adapter name of the pool itself. A backend may not use it.
pub const POOL_ADAPTER: &str = "cluster_pool";

/// Root configuration for a cluster pool.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PoolConfig {
    /// Pool-wide settings.
    pub pool: PoolSettings,

    /// Values merged into every backend entry.
    pub defaults: BackendDefaults,

    /// Backend server definitions, in selection order.
    pub backends: Vec<BackendConfig>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Pool-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolSettings {
    /// How long a failed backend stays out of rotation, in milliseconds.
    pub suppression_ttl_ms: u64,

    /// Name of the primary backend. Overrides per-backend `primary` flags.
    pub primary: Option<String>,
}

impl PoolSettings {
    pub fn suppression_ttl(&self) -> Duration {
        Duration::from_millis(self.suppression_ttl_ms)
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            suppression_ttl_ms: 30_000,
            primary: None,
        }
    }
}

/// Defaults shared by all backends.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendDefaults {
    /// Adapter used when a backend does not name one.
    pub adapter: Option<String>,

    /// Weight used when a backend does not set one.
    pub weight: u32,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for BackendDefaults {
    fn default() -> Self {
        Self {
            adapter: None,
            weight: 1,
            connect_timeout_secs: 5,
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier.
    pub name: String,

    /// Database adapter (e.g., "mysql").
    #[serde(default)]
    pub adapter: Option<String>,

    /// Connection URL (e.g., "mysql://10.0.0.1:3306/app").
    pub url: String,

    /// Weight for weighted selection.
    #[serde(default)]
    pub weight: Option<u32>,

    /// Connection establishment timeout in seconds.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// Marks the primary (write) backend.
    #[serde(default)]
    pub primary: bool,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the background health monitor.
    pub enabled: bool,

    /// Interval between sweeps in seconds.
    pub interval_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// A backend entry with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendDescriptor {
    pub name: BackendId,
    pub adapter: String,
    pub url: Url,
    pub weight: u32,
    pub connect_timeout: Duration,
    pub primary: bool,
}

impl PoolConfig {
    /// Name of the primary backend.
    ///
    /// `pool.primary` wins, then the first backend flagged `primary`, then
    /// the first backend.
    pub fn primary_name(&self) -> Option<&str> {
        self.pool
            .primary
            .as_deref()
            .or_else(|| self.backends.iter().find(|b| b.primary).map(|b| b.name.as_str()))
            .or_else(|| self.backends.first().map(|b| b.name.as_str()))
    }

    /// Resolve every backend entry against the defaults.
    pub fn descriptors(&self) -> Result<Vec<BackendDescriptor>, ValidationError> {
        let primary = self.primary_name();
        self.backends
            .iter()
            .map(|backend| {
                let adapter = backend
                    .adapter
                    .clone()
                    .or_else(|| self.defaults.adapter.clone())
                    .ok_or_else(|| ValidationError::MissingAdapter(backend.name.clone()))?;
                let url = Url::parse(&backend.url).map_err(|e| ValidationError::InvalidUrl {
                    backend: backend.name.clone(),
                    reason: e.to_string(),
                })?;
                let timeout = backend
                    .connect_timeout_secs
                    .unwrap_or(self.defaults.connect_timeout_secs);

                Ok(BackendDescriptor {
                    name: BackendId(backend.name.clone()),
                    adapter,
                    url,
                    weight: backend.weight.unwrap_or(self.defaults.weight),
                    connect_timeout: Duration::from_secs(timeout),
                    primary: Some(backend.name.as_str()) == primary,
                })
            })
            .collect()
    }
}
