//! Errors surfaced by the exporter's lifecycle.

use std::time::Duration;

/// Hard failures of the exporter itself. Upstream problems never show up here.
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    /// The listener could not be bound; no traffic was served.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an I/O error.
    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),

    /// In-flight scrapes were still running when the grace period ran out.
    #[error("shutdown did not complete within {0:?}")]
    ShutdownTimedOut(Duration),
}
