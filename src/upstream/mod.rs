//! Upstream metrics endpoints.
//!
//! # Data Flow
//! ```text
//! ExporterConfig.upstreams
//!     → UpstreamSet (immutable, shared via Arc)
//!     → one Fetcher call per entry per scrape (fetcher.rs)
//!     → Option<Bytes> handed to the aggregator
//! ```
//!
//! # Design Decisions
//! - The set is built once and never mutated, so concurrent scrapes share it without locks
//! - Fetch failures are never errors to the caller, only an absent payload

pub mod fetcher;

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::Arc;

pub use fetcher::{FetchError, Fetcher, HttpFetcher};

/// Immutable mapping of logical service name to metrics URL.
#[derive(Debug, Clone, Default)]
pub struct UpstreamSet {
    entries: Arc<BTreeMap<String, String>>,
}

impl UpstreamSet {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Iterate over `(name, url)` pairs.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, String>> for UpstreamSet {
    fn from(entries: BTreeMap<String, String>) -> Self {
        Self::new(entries)
    }
}

impl<K, V> FromIterator<(K, V)> for UpstreamSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a UpstreamSet {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
