//! One-shot "shutdown complete" notification.

use std::sync::Arc;

use tokio::sync::watch;

/// Handle to the exporter's shutdown-complete event.
///
/// Starts open while the server is being brought up and serving, and is
/// closed exactly once when the server has fully stopped. Clones observe the
/// same event, so health probes or orchestration code can wait on it without
/// owning the exporter.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    tx: Arc<watch::Sender<bool>>,
}

impl ReadySignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Close the signal. Returns `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        self.tx.send_if_modified(|closed| {
            if *closed {
                false
            } else {
                *closed = true;
                true
            }
        })
    }

    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }

    /// Wait until the signal has been closed. Returns at once if it already is.
    pub async fn wait_closed(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}
