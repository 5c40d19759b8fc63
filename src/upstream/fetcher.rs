//! Outbound fetch of a single upstream metrics payload.
//!
//! # Responsibilities
//! - Issue one GET per call, no retries
//! - Bound the whole exchange (connect, headers, body) by one timeout
//! - Log failures and hand the caller an absent payload instead of an error

use std::future::Future;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

const USER_AGENT: &str = concat!("metric-exporter/", env!("CARGO_PKG_VERSION"));

/// Why a single upstream fetch produced no payload.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build request: {0}")]
    InvalidRequest(#[from] axum::http::Error),

    #[error("request failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read response body: {0}")]
    Body(#[from] axum::Error),

    #[error("no complete response within {0:?}")]
    Timeout(Duration),
}

/// Source of upstream payloads for the aggregator.
///
/// `None` means the upstream produced nothing usable for this scrape. The
/// implementation is expected to have logged why; the aggregator only skips it.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, upstream: &str, url: &str) -> impl Future<Output = Option<Bytes>> + Send;
}

/// Plain-HTTP fetcher backed by a pooled hyper client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self { client, timeout }
    }

    /// Fetch the full body of `url`. The status code is not inspected.
    pub async fn try_fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(url)
            .header(header::USER_AGENT, USER_AGENT)
            .body(Body::empty())?;

        let exchange = async {
            let response = self.client.request(request).await?;
            let body = axum::body::to_bytes(Body::new(response.into_body()), usize::MAX).await?;
            Ok::<_, FetchError>(body)
        };

        time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, upstream: &str, url: &str) -> Option<Bytes> {
        let start = Instant::now();
        match self.try_fetch(url).await {
            Ok(body) => {
                tracing::debug!(
                    upstream = %upstream,
                    bytes = body.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Upstream metrics fetched"
                );
                Some(body)
            }
            Err(e) => {
                tracing::error!(upstream = %upstream, url = %url, error = %e, "Upstream fetch failed");
                None
            }
        }
    }
}
