//! Metrics about the exporter itself.
//!
//! # Metrics
//! - `metric_exporter_upstream_fetches_total` (counter): fetches by upstream, outcome
//! - `metric_exporter_scrapes_total` (counter): completed fan-outs
//! - `metric_exporter_scrape_duration_seconds` (histogram): time until the last upstream answered
//! - `metric_exporter_scrape_upstreams_succeeded` (gauge): payloads in the latest scrape
//!
//! Upstream payloads are never parsed or merged into these; they are exposed
//! on their own listener, separate from `/metrics`.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Self-metrics endpoint started");
    Ok(())
}

pub fn record_fetch(upstream: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "metric_exporter_upstream_fetches_total",
        "upstream" => upstream.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_scrape(succeeded: usize, start: Instant) {
    counter!("metric_exporter_scrapes_total").increment(1);
    histogram!("metric_exporter_scrape_duration_seconds").record(start.elapsed().as_secs_f64());
    gauge!("metric_exporter_scrape_upstreams_succeeded").set(succeeded as f64);
}
