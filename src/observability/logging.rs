//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Pick the log level from the environment or from configuration

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
fn default_filter(level: &str) -> String {
    format!("db_cluster_pool={}", level.to_ascii_lowercase())
}

/// Initialize logging. `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter("info"), "db_cluster_pool=info");
        assert_eq!(default_filter("DEBUG"), "db_cluster_pool=debug");
    }
}
