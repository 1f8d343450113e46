//! Weighted, failover-aware database connection pool.
//!
//! Many physical connections (one primary, any number of secondaries) are
//! presented as a single logical connection. Calls go to the current
//! primary, a named backend or a weighted pick; connectivity failures take
//! the backend out of rotation for a fixed window and the call is retried
//! elsewhere.

pub mod backend;
pub mod config;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod pool;

pub use backend::{Backend, BackendError, BackendFactory, BackendHandle, BackendId};
pub use config::PoolConfig;
pub use error::PoolError;
pub use lifecycle::Shutdown;
pub use observability::{NoopObserver, PoolEvent, PoolObserver, TracingObserver};
pub use pool::{ClusterPool, FanOutReport, OperationTable, PoolOptions, PoolStatus, RegistryEntry};
