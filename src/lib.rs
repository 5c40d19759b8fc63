//! Metric Exporter Library
//!
//! Scrape-time fan-out/fan-in bridge: one `GET /metrics` fetches every
//! configured upstream concurrently and streams back the concatenation of the
//! payloads that arrived in time.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod upstream;

pub use config::ExporterConfig;
pub use error::ExporterError;
pub use http::MetricExporter;
pub use lifecycle::{ReadySignal, ServerState, Shutdown};
pub use upstream::{Fetcher, HttpFetcher, UpstreamSet};
