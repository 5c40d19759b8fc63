//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create Axum Router with the `/metrics` handler
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Fan every scrape out to the configured upstreams
//! - Drain in-flight scrapes on shutdown, bounded by the grace period
//! - Close the readiness signal once the listener has stopped

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::time;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::aggregate::fan_out;
use crate::config::ExporterConfig;
use crate::error::ExporterError;
use crate::http::request::{propagate_request_id, request_id, set_request_id};
use crate::lifecycle::shutdown::cancelled;
use crate::lifecycle::{DrainTracker, ReadySignal, ServerState};
use crate::net;
use crate::upstream::{Fetcher, HttpFetcher, UpstreamSet};

/// Listener settings the server needs from its configuration.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Address to bind, e.g. "0.0.0.0:9094".
    pub bind_address: String,
    /// How long in-flight scrapes may run after cancellation.
    pub grace_period: Duration,
}

impl From<&ExporterConfig> for ServerSettings {
    fn from(config: &ExporterConfig) -> Self {
        Self {
            bind_address: config.listener.bind_address.clone(),
            grace_period: config.shutdown.grace_period(),
        }
    }
}

/// Application state injected into handlers.
pub struct AppState<F> {
    pub upstreams: UpstreamSet,
    pub fetcher: Arc<F>,
    pub drain: DrainTracker,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            upstreams: self.upstreams.clone(),
            fetcher: Arc::clone(&self.fetcher),
            drain: self.drain.clone(),
        }
    }
}

/// The metrics aggregation server.
///
/// Owns the listener lifecycle (`Stopped → Listening → Draining → Stopped`)
/// and the readiness signal that reports its end.
pub struct MetricExporter<F = HttpFetcher> {
    upstreams: UpstreamSet,
    fetcher: Arc<F>,
    settings: ServerSettings,
    drain: DrainTracker,
    ready: ReadySignal,
    state: watch::Sender<ServerState>,
}

impl MetricExporter<HttpFetcher> {
    /// Create an exporter fetching over plain HTTP, per the given configuration.
    pub fn new(config: &ExporterConfig) -> Self {
        Self::with_fetcher(
            UpstreamSet::from(config.upstreams.clone()),
            HttpFetcher::new(config.fetch.timeout()),
            ServerSettings::from(config),
        )
    }
}

impl<F: Fetcher> MetricExporter<F> {
    pub fn with_fetcher(upstreams: UpstreamSet, fetcher: F, settings: ServerSettings) -> Self {
        let (state, _) = watch::channel(ServerState::Stopped);
        Self {
            upstreams,
            fetcher: Arc::new(fetcher),
            settings,
            drain: DrainTracker::new(),
            ready: ReadySignal::new(),
            state,
        }
    }

    /// Handle to the one-shot "fully stopped" signal.
    pub fn ready_signal(&self) -> ReadySignal {
        self.ready.clone()
    }

    /// Watch the server's lifecycle state.
    pub fn state(&self) -> watch::Receiver<ServerState> {
        self.state.subscribe()
    }

    /// Number of scrapes whose response is still streaming.
    pub fn in_flight(&self) -> u64 {
        self.drain.active_count()
    }

    /// Build the Axum router with all middleware layers.
    pub fn router(&self) -> Router {
        let state = AppState {
            upstreams: self.upstreams.clone(),
            fetcher: Arc::clone(&self.fetcher),
            drain: self.drain.clone(),
        };

        Router::new()
            .route("/metrics", get(metrics_handler::<F>).head(metrics_head))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id()),
            )
    }

    /// Bind the configured address and serve until `shutdown` fires.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), ExporterError> {
        let listener = match net::bind(&self.settings.bind_address).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, "Error starting HTTP server");
                self.finish();
                return Err(e);
            }
        };

        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` fires, then drain.
    ///
    /// Returns once the listener has stopped. The readiness signal is closed
    /// on every path, after the listener is gone.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ExporterError> {
        let result = self.serve_until_drained(listener, shutdown).await;
        self.finish();
        result
    }

    async fn serve_until_drained(
        &self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ExporterError> {
        let addr = listener.local_addr().map_err(ExporterError::Serve)?;
        let grace_period = self.settings.grace_period;

        let (draining_tx, mut draining_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                cancelled(shutdown).await;
                let _ = draining_tx.send(());
            })
            .into_future();
        tokio::pin!(server);

        self.state.send_replace(ServerState::Listening);
        tracing::info!(
            address = %addr,
            upstreams = self.upstreams.len(),
            "Start to export metrics"
        );

        let stopped = tokio::select! {
            biased;
            result = &mut server => Some(result),
            _ = &mut draining_rx => None,
        };

        // An idle server finishes in the same poll that delivers cancellation.
        let stopped = match stopped {
            Some(result) if draining_rx.try_recv().is_err() => {
                return result.map_err(|e| {
                    tracing::error!(error = %e, "HTTP server stopped unexpectedly");
                    ExporterError::Serve(e)
                });
            }
            stopped => stopped,
        };

        self.state.send_replace(ServerState::Draining);
        tracing::info!(
            grace_period = ?grace_period,
            in_flight = self.drain.active_count(),
            "Shutting down metric exporter"
        );

        let drained = match stopped {
            Some(result) => Ok(result),
            None => time::timeout(grace_period, &mut server).await,
        };

        match drained {
            Ok(Ok(())) => {
                tracing::info!("Metric exporter shut down gracefully");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "HTTP server shutdown error");
                Err(ExporterError::Serve(e))
            }
            Err(_) => {
                let err = ExporterError::ShutdownTimedOut(grace_period);
                tracing::error!(
                    error = %err,
                    abandoned = self.drain.active_count(),
                    "HTTP server shutdown error"
                );
                Err(err)
            }
        }
    }

    /// Final transition to `Stopped`; releases readiness waiters.
    fn finish(&self) {
        self.state.send_replace(ServerState::Stopped);
        if self.ready.close() {
            tracing::debug!("Readiness signal closed");
        }
    }
}

/// `/metrics` handler.
///
/// Responds immediately with 200 and streams upstream payloads as they arrive.
async fn metrics_handler<F: Fetcher>(
    State(state): State<AppState<F>>,
    headers: HeaderMap,
) -> Response {
    let guard = state.drain.track();

    tracing::debug!(
        scrape_id = %guard.id(),
        request_id = %request_id(&headers),
        upstreams = state.upstreams.len(),
        "Scrape started"
    );

    let payloads = fan_out(&state.upstreams, Arc::clone(&state.fetcher)).with_guard(guard);

    (
        [(header::CONTENT_TYPE, "text/plain")],
        Body::from_stream(payloads),
    )
        .into_response()
}

/// `HEAD /metrics`: headers only, no upstream is contacted.
async fn metrics_head() -> impl IntoResponse {
    [(header::CONTENT_TYPE, "text/plain")]
}
