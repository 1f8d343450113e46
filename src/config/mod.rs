//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PoolConfig (validated, immutable)
//!     → PoolConfig::descriptors() (defaults merged per backend)
//!     → ClusterPool::from_config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the registry is built from it once
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::BackendConfig;
pub use schema::BackendDescriptor;
pub use schema::HealthCheckConfig;
pub use schema::ObservabilityConfig;
pub use schema::PoolConfig;
pub use validation::{validate_config, ValidationError};
