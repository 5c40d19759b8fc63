//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscriber's receiver fires once
//!
//! Server (state.rs, drain.rs, readiness.rs):
//!     Stopped → Listening → Draining → Stopped
//!     in-flight scrapes tracked until their body finishes
//!     ReadySignal closed as the very last step
//! ```
//!
//! # Design Decisions
//! - Shutdown has timeout: draining stops waiting after the grace period
//! - The readiness signal closes on every exit path, exactly once

pub mod drain;
pub mod readiness;
pub mod shutdown;
pub mod signals;
pub mod state;

pub use drain::{DrainTracker, InFlightGuard, ScrapeId};
pub use readiness::ReadySignal;
pub use shutdown::Shutdown;
pub use state::ServerState;
