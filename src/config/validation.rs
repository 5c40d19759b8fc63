//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Keep the per-upstream fetch budget inside the shutdown grace period
//! - Check that every upstream URL is reachable by the plain-HTTP client
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ExporterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ExporterConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address `{address}`")]
    InvalidBindAddress { address: String },

    #[error("invalid metrics address `{address}`")]
    InvalidMetricsAddress { address: String },

    #[error("upstream name must not be empty")]
    EmptyUpstreamName,

    #[error("upstream `{name}` has an invalid URL: {reason}")]
    InvalidUpstreamUrl { name: String, reason: String },

    #[error("upstream `{name}` uses unsupported scheme `{scheme}` (only http is supported)")]
    UnsupportedScheme { name: String, scheme: String },

    #[error("fetch timeout must be greater than zero")]
    ZeroFetchTimeout,

    #[error("shutdown grace period must be greater than zero")]
    ZeroGracePeriod,

    #[error("fetch timeout ({fetch_ms}ms) must be shorter than the shutdown grace period ({grace_secs}s)")]
    FetchOutlastsGracePeriod { fetch_ms: u64, grace_secs: u64 },
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &ExporterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            address: config.listener.bind_address.clone(),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress {
            address: config.observability.metrics_address.clone(),
        });
    }

    for (name, url) in &config.upstreams {
        if name.trim().is_empty() {
            errors.push(ValidationError::EmptyUpstreamName);
        }
        if let Err(e) = check_upstream_url(name, url) {
            errors.push(e);
        }
    }

    if config.fetch.timeout_ms == 0 {
        errors.push(ValidationError::ZeroFetchTimeout);
    }
    if config.shutdown.grace_period_secs == 0 {
        errors.push(ValidationError::ZeroGracePeriod);
    }
    if config.fetch.timeout_ms > 0
        && config.shutdown.grace_period_secs > 0
        && config.fetch.timeout() >= config.shutdown.grace_period()
    {
        errors.push(ValidationError::FetchOutlastsGracePeriod {
            fetch_ms: config.fetch.timeout_ms,
            grace_secs: config.shutdown.grace_period_secs,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_upstream_url(name: &str, raw: &str) -> Result<(), ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidUpstreamUrl {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" {
        return Err(ValidationError::UnsupportedScheme {
            name: name.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    if url.host_str().is_none() {
        return Err(ValidationError::InvalidUpstreamUrl {
            name: name.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(())
}
