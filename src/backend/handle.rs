//! Registry entry wrapping one backend.
//!
//! # Responsibilities
//! - Pair a backend with its identity, weight and primary flag
//! - Count suppressions and recoveries for status reporting

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::backend::{Backend, BackendError, BackendId};

/// A backend registered in a pool.
pub struct BackendHandle {
    /// Name from configuration.
    pub id: BackendId,
    /// Selection weight. Zero keeps the backend out of the candidate set.
    pub weight: u32,
    /// Position in registry order.
    pub index: usize,
    /// Whether this is the designated primary.
    pub is_primary: bool,

    backend: Arc<dyn Backend>,

    /// Number of times this backend was suppressed.
    suppressions: AtomicUsize,
    /// Number of successful returns to the usable set.
    recoveries: AtomicUsize,
}

impl BackendHandle {
    pub(crate) fn new(
        id: BackendId,
        backend: Arc<dyn Backend>,
        weight: u32,
        index: usize,
        is_primary: bool,
    ) -> Self {
        Self {
            id,
            weight,
            index,
            is_primary,
            backend,
            suppressions: AtomicUsize::new(0),
            recoveries: AtomicUsize::new(0),
        }
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn suppression_count(&self) -> usize {
        self.suppressions.load(Ordering::Relaxed)
    }

    pub fn recovery_count(&self) -> usize {
        self.recoveries.load(Ordering::Relaxed)
    }

    pub(crate) fn record_suppression(&self) {
        self.suppressions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_recovery(&self) {
        self.recoveries.fetch_add(1, Ordering::Relaxed);
    }

    /// Reconnect and confirm the connection is live afterwards.
    pub(crate) fn try_reconnect(&self) -> Result<(), BackendError> {
        self.backend.reconnect()?;
        if self.backend.is_active() {
            Ok(())
        } else {
            Err(BackendError::Connectivity(
                "connection still inactive after reconnect".to_string(),
            ))
        }
    }
}

impl Deref for BackendHandle {
    type Target = dyn Backend;
    fn deref(&self) -> &Self::Target {
        self.backend.as_ref()
    }
}

impl fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendHandle")
            .field("id", &self.id)
            .field("weight", &self.weight)
            .field("index", &self.index)
            .field("is_primary", &self.is_primary)
            .finish()
    }
}

impl PartialEq for BackendHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BackendHandle {}
