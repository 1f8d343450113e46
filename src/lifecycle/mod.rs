//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → background tasks exit → disconnect every backend
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
