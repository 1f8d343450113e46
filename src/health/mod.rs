//! Background health checking.
//!
//! # Data Flow
//! ```text
//! Periodic timer (active.rs)
//!     → spawn_blocking(ClusterPool::health_sweep)
//!         → reconcile expired suppressions
//!         → suppress secondaries whose connection is no longer active
//!     → publish availability gauges
//! ```
//!
//! # Design Decisions
//! - The monitor never unsuppresses directly; recovery stays with the
//!   availability tracker's reconnect path
//! - The designated primary is probed but never suppressed

pub mod active;

pub use active::HealthMonitor;
