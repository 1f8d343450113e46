//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Availability tracker / dispatcher / fan-out
//!     → events.rs (PoolEvent to the injected PoolObserver)
//!     → TracingObserver
//!         → tracing (structured log events, logging.rs subscriber)
//!         → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The pool depends on the observer trait only, never on a global logger
//! - Metrics are cheap (atomic increments) and no-ops without a recorder

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{NoopObserver, PoolEvent, PoolObserver, TracingObserver};
