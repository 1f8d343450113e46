//! Availability tracking.
//!
//! # States
//! - Usable: backend is a selection candidate
//! - Suppressed: backend is out of rotation until its window expires
//!
//! # State Transitions
//! ```text
//! Usable → Suppressed:      suppress(backend, ttl)
//! Suppressed → Usable:      window expired AND reconnect ok AND is_active()
//! Suppressed → Suppressed:  window expired, reconnect failed (fresh window, same ttl)
//! Full reset:               a suppression left no usable secondary
//!                           → every suppressed backend retried at once
//! ```
//!
//! # Design Decisions
//! - One mutex guards the whole partition; reconnects run while it is held
//!   so a backend is never reconnected by two callers at once
//! - Reads reconcile first, so `candidates()` may perform I/O
//! - A full reset runs once per emptying suppression; backends that fail
//!   it wait out their own window
//! - Events are collected under the lock and delivered after it is released

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use rand::Rng;

use crate::backend::BackendHandle;
use crate::observability::{PoolEvent, PoolObserver};
use crate::pool::registry::Registry;

/// Availability of one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Usable,
    /// No reconnect attempt before `until`; failed attempts reschedule with `ttl`.
    Suppressed { until: Instant, ttl: Duration },
}

impl Availability {
    pub fn is_usable(&self) -> bool {
        matches!(self, Availability::Usable)
    }
}

#[derive(Debug)]
struct TrackerState {
    /// Indexed by registry position.
    slots: Vec<Availability>,
    /// Set when a suppression removes the last usable secondary.
    reset_pending: bool,
}

/// Partitions the registry into usable and suppressed backends.
#[derive(Debug)]
pub struct AvailabilityTracker {
    registry: Arc<Registry>,
    state: Mutex<TrackerState>,
    observer: Arc<dyn PoolObserver>,
}

impl AvailabilityTracker {
    /// All backends start usable.
    pub fn new(registry: Arc<Registry>, observer: Arc<dyn PoolObserver>) -> Self {
        let slots = vec![Availability::Usable; registry.len()];
        Self {
            registry,
            state: Mutex::new(TrackerState {
                slots,
                reset_pending: false,
            }),
            observer,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, events: Vec<PoolEvent>) {
        for event in &events {
            self.observer.on_event(event);
        }
    }

    /// Take a backend out of rotation for `ttl`. Touches no other backend.
    pub fn suppress(&self, backend: &BackendHandle, ttl: Duration) {
        {
            let mut state = self.lock();
            let was_usable = state.slots[backend.index].is_usable();
            state.slots[backend.index] = Availability::Suppressed {
                until: Instant::now() + ttl,
                ttl,
            };
            let counted = !backend.is_primary && self.registry.weighted_set().contains(backend.index);
            if was_usable && counted && !self.secondary_usable(&state) {
                state.reset_pending = true;
            }
        }
        backend.record_suppression();
        self.observer.on_event(&PoolEvent::Suppressed {
            backend: backend.id.clone(),
            ttl,
        });
    }

    /// Retry expired suppressions and run a pending full reset.
    pub fn reconcile(&self) {
        let mut events = Vec::new();
        {
            let mut state = self.lock();
            self.reconcile_locked(&mut state, &mut events);
        }
        self.emit(events);
    }

    /// Usable backends with a positive weight, in registry order.
    ///
    /// Reconciles first. Falls back to the designated primary alone when
    /// nothing else is usable.
    pub fn candidates(&self) -> Vec<Arc<BackendHandle>> {
        let mut events = Vec::new();
        let candidates: Vec<_> = {
            let mut state = self.lock();
            self.reconcile_locked(&mut state, &mut events);
            self.registry
                .weighted_set()
                .indices()
                .filter(|&i| state.slots[i].is_usable())
                .map(|i| self.registry.all()[i].clone())
                .collect()
        };
        self.emit(events);

        if candidates.is_empty() {
            vec![self.registry.primary().clone()]
        } else {
            candidates
        }
    }

    /// Weighted random choice among the candidates.
    pub fn pick_target<R: Rng + ?Sized>(&self, rng: &mut R) -> Arc<BackendHandle> {
        let mut events = Vec::new();
        let picked = {
            let mut state = self.lock();
            self.reconcile_locked(&mut state, &mut events);
            self.registry
                .weighted_set()
                .pick(rng, |i| state.slots[i].is_usable())
        };
        self.emit(events);

        picked
            .map(|i| self.registry.all()[i].clone())
            .unwrap_or_else(|| self.registry.primary().clone())
    }

    /// Current state without reconciling.
    pub fn availability(&self, backend: &BackendHandle) -> Availability {
        self.lock().slots[backend.index]
    }

    pub fn is_usable(&self, backend: &BackendHandle) -> bool {
        self.availability(backend).is_usable()
    }

    /// Current state of every backend, in registry order, without reconciling.
    pub fn snapshot(&self) -> Vec<Availability> {
        self.lock().slots.clone()
    }

    /// Whether any positive-weight backend other than the primary is usable.
    fn secondary_usable(&self, state: &TrackerState) -> bool {
        self.registry
            .weighted_set()
            .indices()
            .any(|i| !self.registry.all()[i].is_primary && state.slots[i].is_usable())
    }

    fn reconcile_locked(&self, state: &mut TrackerState, events: &mut Vec<PoolEvent>) {
        let now = Instant::now();
        for backend in self.registry.all() {
            if let Availability::Suppressed { until, ttl } = state.slots[backend.index] {
                if until <= now {
                    self.attempt_recovery(state, backend, ttl, events);
                }
            }
        }

        if std::mem::take(&mut state.reset_pending) && !self.secondary_usable(state) {
            self.full_reset(state, events);
        }
    }

    fn full_reset(&self, state: &mut TrackerState, events: &mut Vec<PoolEvent>) {
        let suppressed: Vec<_> = self
            .registry
            .all()
            .iter()
            .filter_map(|b| match state.slots[b.index] {
                Availability::Suppressed { ttl, .. } => Some((b.clone(), ttl)),
                Availability::Usable => None,
            })
            .collect();

        events.push(PoolEvent::FullReset {
            backends: suppressed.len(),
        });

        for (backend, ttl) in suppressed {
            state.slots[backend.index] = Availability::Usable;
            self.attempt_recovery(state, &backend, ttl, events);
        }
    }

    fn attempt_recovery(
        &self,
        state: &mut TrackerState,
        backend: &BackendHandle,
        ttl: Duration,
        events: &mut Vec<PoolEvent>,
    ) {
        events.push(PoolEvent::ReconnectAttempt {
            backend: backend.id.clone(),
        });

        match backend.try_reconnect() {
            Ok(()) => {
                state.slots[backend.index] = Availability::Usable;
                backend.record_recovery();
                events.push(PoolEvent::Recovered {
                    backend: backend.id.clone(),
                });
            }
            Err(error) => {
                state.slots[backend.index] = Availability::Suppressed {
                    until: Instant::now() + ttl,
                    ttl,
                };
                events.push(PoolEvent::ReconnectFailed {
                    backend: backend.id.clone(),
                    error,
                    retry_in: ttl,
                });
            }
        }
    }
}
