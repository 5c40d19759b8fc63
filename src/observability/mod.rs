//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms about the exporter itself)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → optional Prometheus endpoint for self-metrics
//! ```
//!
//! # Design Decisions
//! - Without an installed recorder the metrics macros are no-ops, so tests need no setup

pub mod logging;
pub mod metrics;
