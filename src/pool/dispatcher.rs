//! Call dispatch with failover.
//!
//! # Data Flow
//! ```text
//! invoke(target, operation, args)
//!     → operation table check (unknown / wrong arity → Invocation error)
//!     → tracker.reconcile()
//!     → target.invoke()
//!         Ok                    → return
//!         Invocation error      → return
//!         error, target active  → Application error, no suppression
//!         error, target dead    → suppress (never the designated primary)
//!                                 → next target, retry
//! ```
//!
//! # Design Decisions
//! - Each backend is tried at most once per call; attempts are capped at
//!   the registry size
//! - Retries are sequential, never concurrent
//! - A dead current primary is replaced by the next live backend

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use serde_json::Value;

use crate::backend::{BackendError, BackendHandle};
use crate::error::PoolError;
use crate::observability::{PoolEvent, PoolObserver};
use crate::pool::availability::AvailabilityTracker;
use crate::pool::operations::OperationTable;
use crate::pool::registry::Registry;

/// Routes calls to backends and fails over on connectivity errors.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    tracker: Arc<AvailabilityTracker>,
    operations: OperationTable,
    current_primary: ArcSwap<BackendHandle>,
    suppression_ttl: Duration,
    observer: Arc<dyn PoolObserver>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Registry>,
        tracker: Arc<AvailabilityTracker>,
        operations: OperationTable,
        suppression_ttl: Duration,
        observer: Arc<dyn PoolObserver>,
    ) -> Self {
        let current_primary = ArcSwap::new(registry.primary().clone());
        Self {
            registry,
            tracker,
            operations,
            current_primary,
            suppression_ttl,
            observer,
        }
    }

    /// The backend currently serving as primary.
    pub fn current_primary(&self) -> Arc<BackendHandle> {
        self.current_primary.load_full()
    }

    pub fn operations(&self) -> &OperationTable {
        &self.operations
    }

    /// Run `operation` on `target`, failing over while backends are dead.
    pub fn invoke(
        &self,
        target: Arc<BackendHandle>,
        operation: &str,
        args: &[Value],
    ) -> Result<Value, PoolError> {
        self.operations.check(operation, args.len())?;
        self.tracker.reconcile();

        let max_attempts = self.registry.len();
        let mut tried: Vec<usize> = Vec::with_capacity(max_attempts);
        let mut target = target;

        loop {
            tried.push(target.index);

            let error = match target.invoke(operation, args) {
                Ok(value) => return Ok(value),
                Err(BackendError::Invocation(reason)) => {
                    return Err(PoolError::Invocation {
                        operation: operation.to_string(),
                        reason,
                    });
                }
                Err(error) => error,
            };

            if target.is_active() {
                return Err(PoolError::Application {
                    backend: target.id.clone(),
                    operation: operation.to_string(),
                    source: error,
                });
            }

            tracing::debug!(
                backend = %target.id,
                operation = %operation,
                attempt = tried.len(),
                error = %error,
                "Connectivity failure"
            );

            if !target.is_primary {
                self.tracker.suppress(&target, self.suppression_ttl);
            }

            let next = if tried.len() < max_attempts {
                self.next_target(&tried)
            } else {
                None
            };
            let Some(next) = next else {
                return Err(PoolError::PoolExhausted {
                    operation: operation.to_string(),
                    attempts: tried.len(),
                    last_error: error,
                });
            };

            self.observer.on_event(&PoolEvent::Failover {
                operation: operation.to_string(),
                from: target.id.clone(),
                to: next.id.clone(),
            });
            if self.current_primary().id == target.id {
                self.promote(&next);
            }
            target = next;
        }
    }

    /// Next live backend not yet tried in this call.
    ///
    /// Preference: current primary, designated primary, then the remaining
    /// candidates in registry order. The designated primary is the last
    /// resort even when it does not report active.
    fn next_target(&self, tried: &[usize]) -> Option<Arc<BackendHandle>> {
        let designated = self.registry.primary().clone();
        let preferred = [self.current_primary(), designated.clone()];
        let candidates = self.tracker.candidates();

        let live = preferred
            .into_iter()
            .filter(|b| self.tracker.is_usable(b))
            .chain(candidates)
            .filter(|b| !tried.contains(&b.index))
            .find(|b| b.is_active());

        live.or_else(|| (!tried.contains(&designated.index)).then_some(designated))
    }

    fn promote(&self, next: &Arc<BackendHandle>) {
        let previous = self.current_primary.swap(next.clone());
        if previous.id != next.id {
            self.observer.on_event(&PoolEvent::PrimaryChanged {
                from: previous.id.clone(),
                to: next.id.clone(),
            });
        }
    }
}
