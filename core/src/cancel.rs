//! Cooperative cancellation for in-flight requests.

use std::sync::Arc;

use tokio::sync::watch;

/// A cloneable signal that aborts the request it is attached to.
///
/// All clones share one flag. Cancelling is idempotent and may happen before
/// the request is sent, while it is in flight, or after it finished (in which
/// case it has no effect on the already-returned result).
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raise the signal. Returns `true` if this call was the one that
    /// cancelled, `false` if the handle was already cancelled.
    pub fn cancel(&self) -> bool {
        !self.tx.send_replace(true)
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal has been raised.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns once the
        // flag is set.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}
