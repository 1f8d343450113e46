//! Backend abstraction.
//!
//! # Responsibilities
//! - Define the capability set the pool needs from one physical connection
//! - Classify backend failures (connectivity, application, invocation)
//! - Build backends from normalized descriptors through an injected factory
//!
//! # Design Decisions
//! - Backends are shared (`Arc<dyn Backend>`) and take `&self`; each
//!   implementation synchronizes its own connection state
//! - Arguments and results are `serde_json::Value` so any operation can be
//!   forwarded without knowing its signature
//! - I/O is blocking; timeouts belong to the implementation

pub mod handle;
pub mod tcp;

#[cfg(test)]
pub(crate) mod mock;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::BackendDescriptor;

pub use handle::BackendHandle;

/// Identity of a backend within one pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BackendId(pub String);

impl BackendId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BackendId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for BackendId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Failures reported by a backend implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// The backend could not be reached or the connection dropped.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// The backend is reachable but rejected the operation.
    #[error("application error: {0}")]
    Application(String),

    /// The operation or its argument count is not supported.
    #[error("invocation error: {0}")]
    Invocation(String),
}

/// One physical database connection as seen by the pool.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Cheap liveness probe. Returns false only for a dead connection.
    fn is_active(&self) -> bool;

    /// Re-establish the connection. Idempotent when already connected.
    fn reconnect(&self) -> Result<(), BackendError>;

    /// Tear down the connection.
    fn disconnect(&self) -> Result<(), BackendError>;

    /// Reset session state without dropping the connection.
    fn reset(&self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Implementation-specific health check.
    fn verify(&self, args: &[Value]) -> Result<(), BackendError>;

    /// Return and zero the cumulative seconds spent executing operations.
    fn reset_runtime(&self) -> Result<f64, BackendError>;

    /// Generic entry point for every forwarded operation.
    fn invoke(&self, operation: &str, args: &[Value]) -> Result<Value, BackendError>;
}

/// Creates backends from descriptors.
///
/// Constructed once by the caller and passed to the pool by reference.
pub trait BackendFactory {
    fn connect(&self, descriptor: &BackendDescriptor) -> Result<Arc<dyn Backend>, BackendError>;
}
