//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (primary names an existing backend)
//! - Validate value ranges (weights, timeouts, intervals)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PoolConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::{PoolConfig, POOL_ADAPTER};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,

    #[error("backend `{0}` is defined more than once")]
    DuplicateBackend(String),

    #[error("backend `{0}` does not specify an adapter")]
    MissingAdapter(String),

    #[error("backend `{0}` uses the pool adapter itself")]
    RecursiveAdapter(String),

    #[error("backend `{backend}` has an invalid url: {reason}")]
    InvalidUrl { backend: String, reason: String },

    #[error("total backend weight is zero")]
    ZeroTotalWeight,

    #[error("more than one backend is flagged primary: {}", .0.join(", "))]
    MultiplePrimaries(Vec<String>),

    #[error("primary `{0}` is not a configured backend")]
    UnknownPrimary(String),

    #[error("backend `{0}` has a zero connect timeout")]
    ZeroConnectTimeout(String),

    #[error("suppression ttl must be greater than zero")]
    ZeroSuppressionTtl,

    #[error("health check interval must be greater than zero")]
    ZeroHealthInterval,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &PoolConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen = HashSet::new();
    let mut total_weight: u64 = 0;
    for backend in &config.backends {
        if !seen.insert(backend.name.as_str()) {
            errors.push(ValidationError::DuplicateBackend(backend.name.clone()));
        }

        match backend.adapter.as_deref().or(config.defaults.adapter.as_deref()) {
            None => errors.push(ValidationError::MissingAdapter(backend.name.clone())),
            Some(POOL_ADAPTER) => errors.push(ValidationError::RecursiveAdapter(backend.name.clone())),
            Some(_) => {}
        }

        if let Err(e) = Url::parse(&backend.url) {
            errors.push(ValidationError::InvalidUrl {
                backend: backend.name.clone(),
                reason: e.to_string(),
            });
        }

        if backend.connect_timeout_secs.unwrap_or(config.defaults.connect_timeout_secs) == 0 {
            errors.push(ValidationError::ZeroConnectTimeout(backend.name.clone()));
        }

        total_weight += u64::from(backend.weight.unwrap_or(config.defaults.weight));
    }

    if !config.backends.is_empty() && total_weight == 0 {
        errors.push(ValidationError::ZeroTotalWeight);
    }

    let flagged: Vec<String> = config
        .backends
        .iter()
        .filter(|b| b.primary)
        .map(|b| b.name.clone())
        .collect();
    if flagged.len() > 1 && config.pool.primary.is_none() {
        errors.push(ValidationError::MultiplePrimaries(flagged));
    }

    if let Some(primary) = &config.pool.primary {
        if !seen.contains(primary.as_str()) {
            errors.push(ValidationError::UnknownPrimary(primary.clone()));
        }
    }

    if config.pool.suppression_ttl_ms == 0 {
        errors.push(ValidationError::ZeroSuppressionTtl);
    }

    if config.health_check.enabled && config.health_check.interval_secs == 0 {
        errors.push(ValidationError::ZeroHealthInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
