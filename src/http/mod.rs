//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, graceful shutdown)
//!     → request.rs (request ID assigned and echoed)
//!     → /metrics handler → aggregate::fan_out
//!     → 200 text/plain, body streamed as upstreams answer
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, MetricExporter, ServerSettings};
