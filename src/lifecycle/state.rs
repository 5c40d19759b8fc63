//! Server lifecycle states.

use std::fmt;

/// Where the exporter's listener is in its lifecycle.
///
/// ```text
/// Stopped → Listening → Draining → Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Not bound, or fully shut down.
    Stopped,
    /// Accepting connections and serving scrapes.
    Listening,
    /// No longer accepting; in-flight scrapes finishing within the grace period.
    Draining,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServerState::Stopped => "stopped",
            ServerState::Listening => "listening",
            ServerState::Draining => "draining",
        };
        f.write_str(s)
    }
}
