//! Metric Exporter
//!
//! Exposes one scrape target that fans out to every configured upstream.
//!
//! ```text
//!                    ┌──────────────────────────────────────────┐
//!                    │              METRIC EXPORTER             │
//!   GET /metrics     │  ┌────────┐    ┌───────────┐             │      ┌────────────┐
//!  ──────────────────┼─▶│  http  │───▶│ aggregate │──fetch──────┼─────▶│ upstream 1 │
//!                    │  │ server │    │  fan-out  │──fetch──────┼─────▶│ upstream 2 │
//!  200 text/plain    │  │        │    │           │──fetch──────┼─────▶│ upstream N │
//!  ◀─────────────────┼──│        │◀───│  fan-in   │◀─ payloads ─┼──────│            │
//!                    │  └────────┘    └───────────┘             │      └────────────┘
//!                    │  lifecycle: signal → drain (grace) → ready closed
//!                    └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use metric_exporter::config::{load_config, validate_config, ConfigError, ExporterConfig};
use metric_exporter::lifecycle::{signals, Shutdown};
use metric_exporter::observability::{logging, metrics};
use metric_exporter::MetricExporter;

#[derive(Parser, Debug)]
#[command(name = "metric-exporter", version)]
#[command(about = "Aggregate upstream metrics endpoints behind a single scrape target", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration (e.g. 0.0.0.0:9094)
    #[arg(short, long)]
    bind: Option<String>,

    /// Add or replace an upstream; repeatable
    #[arg(short, long = "upstream", value_name = "NAME=URL", value_parser = parse_upstream)]
    upstreams: Vec<(String, String)>,

    /// Log level, overriding the configuration
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Merge the file (or defaults) with command-line overrides, then validate.
    fn into_config(self) -> Result<ExporterConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ExporterConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        config.upstreams.extend(self.upstreams);
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

fn parse_upstream(raw: &str) -> Result<(String, String), String> {
    let (name, url) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=URL, got `{raw}`"))?;
    Ok((name.trim().to_string(), url.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init_logging(&config.observability);

    tracing::info!("metric-exporter v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstreams = config.upstreams.len(),
        fetch_timeout_ms = config.fetch.timeout_ms,
        grace_period_secs = config.shutdown.grace_period_secs,
        "Configuration loaded"
    );
    if config.upstreams.is_empty() {
        tracing::warn!("No upstreams configured, every scrape will be empty");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start self-metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let exporter = MetricExporter::new(&config);
    let ready = exporter.ready_signal();
    let mut server = tokio::spawn(exporter.run(shutdown.subscribe()));

    let finished_early = tokio::select! {
        result = &mut server => Some(result),
        _ = signals::shutdown_signal() => None,
    };
    let result = match finished_early {
        Some(result) => result,
        None => {
            tracing::info!("Shutting down metric exporter");
            shutdown.trigger();
            server.await
        }
    };

    ready.wait_closed().await;
    result??;

    tracing::info!("Shutdown complete");
    Ok(())
}
