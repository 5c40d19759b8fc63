//! In-flight scrape tracking for graceful shutdown.
//!
//! # Responsibilities
//! - Count scrapes whose response body is still streaming
//! - Give each scrape a unique ID for tracing
//! - Report what was abandoned when the grace period runs out

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global atomic counter for scrape IDs.
static SCRAPE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for one scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScrapeId(u64);

impl ScrapeId {
    /// Generate a new unique scrape ID.
    pub fn new() -> Self {
        Self(SCRAPE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ScrapeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScrapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scrape-{}", self.0)
    }
}

/// Tracks scrapes that are still in flight.
#[derive(Debug, Clone, Default)]
pub struct DrainTracker {
    active: Arc<AtomicU64>,
}

impl DrainTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new in-flight scrape. The count drops when the guard does.
    pub fn track(&self) -> InFlightGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            active: Arc::clone(&self.active),
            id: ScrapeId::new(),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Guard held for the lifetime of one scrape's response stream.
#[derive(Debug)]
pub struct InFlightGuard {
    active: Arc<AtomicU64>,
    id: ScrapeId,
}

impl InFlightGuard {
    pub fn id(&self) -> ScrapeId {
        self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(scrape_id = %self.id, "Scrape finished");
    }
}
