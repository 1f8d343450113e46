//! Weighted, failover-aware cluster pool.
//!
//! # Responsibilities
//! - Present many backends as one logical connection
//! - Route calls to the current primary, a named backend or a weighted pick
//! - Keep dead backends out of rotation until they reconnect
//! - Apply lifecycle operations to every backend
//!
//! # Data Flow
//! ```text
//! caller → ClusterPool::invoke(op, args)
//!        → Dispatcher (arity check → reconcile → backend.invoke)
//!              └─ connectivity failure → AvailabilityTracker::suppress → retry
//! caller → ClusterPool::reconnect_all() / verify_all() / ...
//!        → FanOut (every backend, errors reported, never propagated)
//! ```
//!
//! # Design Decisions
//! - The registry is immutable; only availability and the current primary change
//! - Backend I/O is blocking; async callers use `spawn_blocking`

pub mod availability;
pub mod dispatcher;
pub mod fanout;
pub mod forward;
pub mod operations;
pub mod registry;
pub mod status;
pub mod weighted;

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use serde_json::Value;

use crate::backend::{BackendError, BackendFactory, BackendHandle, BackendId};
use crate::config::{validate_config, PoolConfig};
use crate::error::PoolError;
use crate::observability::PoolObserver;

pub use availability::{Availability, AvailabilityTracker};
pub use dispatcher::Dispatcher;
pub use fanout::{FanOut, FanOutReport};
pub use operations::{Arity, OperationTable};
pub use registry::{Registry, RegistryEntry};
pub use status::{BackendStatus, PoolStatus};
pub use weighted::WeightedSet;

/// Tunables fixed at construction.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Suppression window after a connectivity failure.
    pub suppression_ttl: Duration,
    /// Operations the pool will forward.
    pub operations: OperationTable,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            suppression_ttl: Duration::from_secs(30),
            operations: OperationTable::standard(),
        }
    }
}

/// A set of backends behaving as one connection.
#[derive(Debug)]
pub struct ClusterPool {
    registry: Arc<Registry>,
    tracker: Arc<AvailabilityTracker>,
    dispatcher: Dispatcher,
    fanout: FanOut,
    suppression_ttl: Duration,
}

impl ClusterPool {
    /// Build a pool over already-connected backends.
    pub fn new(
        entries: Vec<RegistryEntry>,
        primary: &BackendId,
        options: PoolOptions,
        observer: Arc<dyn PoolObserver>,
    ) -> Result<Self, PoolError> {
        let registry = Arc::new(Registry::build(entries, primary)?);
        let tracker = Arc::new(AvailabilityTracker::new(registry.clone(), observer.clone()));
        let dispatcher = Dispatcher::new(
            registry.clone(),
            tracker.clone(),
            options.operations,
            options.suppression_ttl,
            observer.clone(),
        );
        let fanout = FanOut::new(registry.clone(), observer);

        tracing::info!(
            backends = registry.len(),
            primary = %registry.primary().id,
            total_weight = registry.weighted_set().total_weight(),
            "Cluster pool initialized"
        );

        Ok(Self {
            registry,
            tracker,
            dispatcher,
            fanout,
            suppression_ttl: options.suppression_ttl,
        })
    }

    /// Validate `config`, connect every backend through `factory` and build the pool.
    ///
    /// Backends that fail to connect are skipped. If the primary is among
    /// them, the first connected backend with a positive weight takes its place.
    pub fn from_config(
        config: &PoolConfig,
        factory: &dyn BackendFactory,
        observer: Arc<dyn PoolObserver>,
    ) -> Result<Self, PoolError> {
        validate_config(config).map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
            PoolError::Configuration(messages.join("; "))
        })?;
        let descriptors = config
            .descriptors()
            .map_err(|e| PoolError::Configuration(e.to_string()))?;

        let mut entries = Vec::with_capacity(descriptors.len());
        let mut primary = None;
        let mut skipped = Vec::new();
        for descriptor in &descriptors {
            match factory.connect(descriptor) {
                Ok(backend) => {
                    tracing::debug!(backend = %descriptor.name, url = %descriptor.url, "Backend connected");
                    if descriptor.primary {
                        primary = Some(descriptor.name.clone());
                    }
                    entries.push(RegistryEntry::new(descriptor.name.clone(), backend, descriptor.weight));
                }
                Err(error) => {
                    tracing::error!(
                        backend = %descriptor.name,
                        url = %descriptor.url,
                        error = %error,
                        "Error connecting to backend, skipping"
                    );
                    skipped.push(descriptor.name.to_string());
                }
            }
        }

        if entries.iter().all(|e| e.weight == 0) {
            let connected = if entries.is_empty() {
                "no backend could be connected".to_string()
            } else {
                "no backend with a positive weight could be connected".to_string()
            };
            return Err(PoolError::Configuration(format!(
                "{} (skipped: {})",
                connected,
                skipped.join(", ")
            )));
        }

        let primary = match primary {
            Some(primary) => primary,
            None => {
                let first = entries.iter().find(|e| e.weight > 0).ok_or_else(|| {
                    PoolError::Configuration("no weighted backend connected".to_string())
                })?;
                tracing::warn!(
                    backend = %first.id,
                    skipped = %skipped.join(", "),
                    "Primary unavailable, using first connected weighted backend as primary"
                );
                first.id.clone()
            }
        };

        let options = PoolOptions {
            suppression_ttl: config.pool.suppression_ttl(),
            ..PoolOptions::default()
        };
        Self::new(entries, &primary, options, observer)
    }

    /// Run `operation` on the current primary.
    pub fn invoke(&self, operation: &str, args: &[Value]) -> Result<Value, PoolError> {
        self.dispatcher.invoke(self.current_primary(), operation, args)
    }

    /// Run `operation` on a named backend, failing over if it is dead.
    pub fn invoke_on(&self, id: &BackendId, operation: &str, args: &[Value]) -> Result<Value, PoolError> {
        let target = self.lookup(id)?;
        self.dispatcher.invoke(target, operation, args)
    }

    /// Run `operation` on a weighted random candidate.
    pub fn invoke_balanced(&self, operation: &str, args: &[Value]) -> Result<Value, PoolError> {
        self.dispatcher.invoke(self.pick_target(), operation, args)
    }

    /// Usable weighted backends in registry order; the primary alone when none are.
    pub fn candidates(&self) -> Vec<Arc<BackendHandle>> {
        self.tracker.candidates()
    }

    pub fn pick_target(&self) -> Arc<BackendHandle> {
        self.pick_target_with(&mut rand::thread_rng())
    }

    pub fn pick_target_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Arc<BackendHandle> {
        self.tracker.pick_target(rng)
    }

    /// Take a backend out of rotation. `ttl` defaults to the pool's suppression ttl.
    pub fn suppress_backend(&self, id: &BackendId, ttl: Option<Duration>) -> Result<(), PoolError> {
        let backend = self.lookup(id)?;
        self.tracker.suppress(&backend, ttl.unwrap_or(self.suppression_ttl));
        Ok(())
    }

    /// Retry expired suppressions now.
    pub fn reconcile(&self) {
        self.tracker.reconcile();
    }

    pub fn current_primary(&self) -> Arc<BackendHandle> {
        self.dispatcher.current_primary()
    }

    pub fn designated_primary(&self) -> &Arc<BackendHandle> {
        self.registry.primary()
    }

    /// Every registered backend, whatever its availability.
    pub fn all_backends(&self) -> &[Arc<BackendHandle>] {
        self.registry.all()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn operations(&self) -> &OperationTable {
        self.dispatcher.operations()
    }

    pub fn availability(&self, id: &BackendId) -> Result<Availability, PoolError> {
        let backend = self.lookup(id)?;
        Ok(self.tracker.availability(&backend))
    }

    pub fn for_each<F>(&self, operation: &str, op: F) -> FanOutReport
    where
        F: FnMut(&BackendHandle) -> Result<(), BackendError>,
    {
        self.fanout.for_each(operation, op)
    }

    pub fn for_each_collecting<T, R, F, C>(&self, operation: &str, init: T, op: F, combine: C) -> (T, FanOutReport)
    where
        F: FnMut(&BackendHandle) -> Result<R, BackendError>,
        C: FnMut(T, R) -> T,
    {
        self.fanout.for_each_collecting(operation, init, op, combine)
    }

    pub fn reconnect_all(&self) -> FanOutReport {
        self.fanout.for_each("reconnect", |b| b.reconnect())
    }

    pub fn disconnect_all(&self) -> FanOutReport {
        self.fanout.for_each("disconnect", |b| b.disconnect())
    }

    pub fn reset_all(&self) -> FanOutReport {
        self.fanout.for_each("reset", |b| b.reset())
    }

    pub fn verify_all(&self, args: &[Value]) -> FanOutReport {
        self.fanout.for_each("verify", |b| b.verify(args))
    }

    /// True only if every backend reports active. Probes all of them.
    pub fn active_check(&self) -> bool {
        let (active, _) = self
            .fanout
            .for_each_collecting("active", true, |b| Ok(b.is_active()), |all, one| all && one);
        active
    }

    /// Sum and zero the runtime of every backend. Failing backends count as 0.
    pub fn sum_runtime_stats(&self) -> f64 {
        let (total, _) = self
            .fanout
            .for_each_collecting("reset_runtime", 0.0, |b| b.reset_runtime(), |sum, secs| sum + secs);
        total
    }

    /// Reconcile, then suppress every usable secondary that no longer reports active.
    ///
    /// Returns the backends suppressed by this sweep.
    pub fn health_sweep(&self) -> Vec<BackendId> {
        let mut suppressed = Vec::new();
        for backend in self.tracker.candidates() {
            if backend.is_primary || !self.tracker.is_usable(&backend) {
                continue;
            }
            if !backend.is_active() {
                self.tracker.suppress(&backend, self.suppression_ttl);
                suppressed.push(backend.id.clone());
            }
        }
        suppressed
    }

    pub fn status(&self) -> PoolStatus {
        let now = Instant::now();
        let snapshot = self.tracker.snapshot();
        let total_weight = self.registry.weighted_set().total_weight();

        let backends: Vec<BackendStatus> = self
            .registry
            .all()
            .iter()
            .map(|b| BackendStatus::new(b, snapshot[b.index], total_weight, now))
            .collect();
        let usable = backends.iter().filter(|b| b.usable).count();

        PoolStatus {
            designated_primary: self.registry.primary().id.clone(),
            current_primary: self.current_primary().id.clone(),
            total_weight,
            usable,
            suppressed: backends.len() - usable,
            backends,
        }
    }

    fn lookup(&self, id: &BackendId) -> Result<Arc<BackendHandle>, PoolError> {
        self.registry
            .get(id)
            .cloned()
            .ok_or_else(|| PoolError::UnknownBackend(id.clone()))
    }
}
