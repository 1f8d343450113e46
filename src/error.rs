//! Pool-level error definitions.

use thiserror::Error;

use crate::backend::{BackendError, BackendId};

/// Errors surfaced to callers of the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Invalid backend list, missing primary or zero total weight.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The backend is alive but the operation itself failed.
    #[error("Operation `{operation}` failed on {backend}: {source}")]
    Application {
        backend: BackendId,
        operation: String,
        #[source]
        source: BackendError,
    },

    /// Unknown operation or an argument count the backend does not accept.
    #[error("Cannot invoke `{operation}`: {reason}")]
    Invocation { operation: String, reason: String },

    /// Every eligible backend failed with a connectivity error.
    #[error("All backends exhausted for `{operation}` after {attempts} attempt(s): {last_error}")]
    PoolExhausted {
        operation: String,
        attempts: usize,
        last_error: BackendError,
    },

    /// A backend name that is not part of the registry.
    #[error("Unknown backend: {0}")]
    UnknownBackend(BackendId),
}
