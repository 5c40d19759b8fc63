//! Scrape-time fan-out / fan-in.
//!
//! # Data Flow
//! ```text
//! UpstreamSet (N entries)
//!     → N fetch tasks (one per upstream, no ordering between them)
//!     → mpsc channel, capacity N (producers never wait)
//!     → supervisor joins all N, then drops the last sender (end-of-stream)
//!     → ScrapeStream yields payloads in arrival order, skipping absences
//! ```
//!
//! # Design Decisions
//! - Arrival order, not configuration order: lowest latency to first byte
//! - Payloads are opaque and written back to back with no delimiter
//! - A failed or panicked fetch only removes that upstream's payload

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::Instant;

use axum::body::Bytes;
use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::lifecycle::InFlightGuard;
use crate::observability::metrics;
use crate::upstream::{Fetcher, UpstreamSet};

/// Launch one fetch per upstream and return the merged result stream.
///
/// Must be called from within a Tokio runtime.
pub fn fan_out<F: Fetcher>(upstreams: &UpstreamSet, fetcher: Arc<F>) -> ScrapeStream {
    let start = Instant::now();
    let (tx, rx) = mpsc::channel(upstreams.len().max(1));
    let mut fetches = JoinSet::new();

    for (name, url) in upstreams {
        let fetcher = Arc::clone(&fetcher);
        let tx = tx.clone();
        let name = name.clone();
        let url = url.clone();

        fetches.spawn(async move {
            let payload = fetcher.fetch(&name, &url).await;
            let fetched = payload.is_some();
            metrics::record_fetch(&name, fetched);
            if !fetched {
                tracing::warn!(upstream = %name, "Metrics query failed");
            }
            // Capacity covers every producer; a send error only means the
            // scraper went away.
            let _ = tx.send(payload).await;
            fetched
        });
    }

    tokio::spawn(supervise(fetches, tx, start));

    ScrapeStream { rx, guard: None }
}

/// Wait for every fetch, then end the stream by dropping the original sender.
async fn supervise(mut fetches: JoinSet<bool>, tx: mpsc::Sender<Option<Bytes>>, start: Instant) {
    let total = fetches.len();
    let mut succeeded = 0usize;

    while let Some(joined) = fetches.join_next().await {
        match joined {
            Ok(true) => succeeded += 1,
            Ok(false) => {}
            Err(e) => tracing::error!(error = %e, "Upstream fetch task failed"),
        }
    }

    metrics::record_scrape(succeeded, start);
    tracing::debug!(
        upstreams = total,
        succeeded,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Scrape fan-out complete"
    );

    drop(tx);
}

/// Payloads of one scrape, in the order upstreams answered.
#[derive(Debug)]
pub struct ScrapeStream {
    rx: mpsc::Receiver<Option<Bytes>>,
    guard: Option<InFlightGuard>,
}

impl ScrapeStream {
    /// Keep `guard` alive until the stream is finished or dropped.
    pub fn with_guard(mut self, guard: InFlightGuard) -> Self {
        self.guard = Some(guard);
        self
    }
}

impl Stream for ScrapeStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(self.rx.poll_recv(cx)) {
                Some(Some(payload)) => return Poll::Ready(Some(Ok(payload))),
                Some(None) => continue,
                None => {
                    self.guard.take();
                    return Poll::Ready(None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use futures_util::StreamExt;

    use crate::lifecycle::DrainTracker;

    /// Answers each upstream after a fixed delay; `None` body means failure.
    struct ScriptedFetcher {
        script: HashMap<&'static str, (u64, Option<&'static str>)>,
    }

    impl ScriptedFetcher {
        fn new(script: &[(&'static str, u64, Option<&'static str>)]) -> Arc<Self> {
            Arc::new(Self {
                script: script.iter().map(|&(n, d, b)| (n, (d, b))).collect(),
            })
        }
    }

    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, upstream: &str, _url: &str) -> Option<Bytes> {
            let (delay, body) = self.script[upstream];
            if body == Some("panic") {
                panic!("scripted panic for {upstream}");
            }
            tokio::time::sleep(Duration::from_millis(delay)).await;
            body.map(|b| Bytes::from_static(b.as_bytes()))
        }
    }

    fn upstreams(names: &[&str]) -> UpstreamSet {
        names
            .iter()
            .map(|n| (n.to_string(), format!("http://{n}/metrics")))
            .collect()
    }

    async fn collect(stream: ScrapeStream) -> Vec<Bytes> {
        stream.map(|item| item.unwrap()).collect().await
    }

    #[tokio::test(start_paused = true)]
    async fn yields_in_arrival_order() {
        let fetcher = ScriptedFetcher::new(&[
            ("a", 50, Some("A\n")),
            ("b", 10, Some("B\n")),
            ("c", 30, Some("C\n")),
        ]);

        let out = collect(fan_out(&upstreams(&["a", "b", "c"]), fetcher)).await;
        assert_eq!(out, vec!["B\n", "C\n", "A\n"]);
    }

    #[tokio::test(start_paused = true)]
    async fn skips_failed_upstreams() {
        let fetcher = ScriptedFetcher::new(&[
            ("a", 10, Some("X")),
            ("b", 20, None),
            ("c", 5, None),
        ]);

        let out = collect(fan_out(&upstreams(&["a", "b", "c"]), fetcher)).await;
        assert_eq!(out, vec!["X"]);
    }

    #[tokio::test(start_paused = true)]
    async fn all_failed_is_empty() {
        let fetcher = ScriptedFetcher::new(&[("a", 1, None), ("b", 2, None)]);
        assert!(collect(fan_out(&upstreams(&["a", "b"]), fetcher)).await.is_empty());
    }

    #[tokio::test]
    async fn no_upstreams_ends_immediately() {
        let fetcher = ScriptedFetcher::new(&[]);
        let out = tokio::time::timeout(
            Duration::from_secs(1),
            collect(fan_out(&UpstreamSet::default(), fetcher)),
        )
        .await
        .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_fetch_does_not_abort_scrape() {
        let fetcher = ScriptedFetcher::new(&[("a", 10, Some("A")), ("boom", 0, Some("panic"))]);
        let out = collect(fan_out(&upstreams(&["a", "boom"]), fetcher)).await;
        assert_eq!(out, vec!["A"]);
    }

    #[tokio::test(start_paused = true)]
    async fn guard_released_when_stream_ends() {
        let tracker = DrainTracker::new();
        let fetcher = ScriptedFetcher::new(&[("a", 10, Some("A"))]);

        let mut stream = fan_out(&upstreams(&["a"]), fetcher).with_guard(tracker.track());
        assert_eq!(tracker.active_count(), 1);

        assert!(stream.next().await.is_some());
        assert_eq!(tracker.active_count(), 1);
        assert!(stream.next().await.is_none());
        assert_eq!(tracker.active_count(), 0);
    }
}
