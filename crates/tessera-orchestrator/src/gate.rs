//! One-shot start gate.
//!
//! Activation loaders wait on the gate before fetching anything, so no app
//! loads until `start` has published the final configuration.

use tokio::sync::watch;

/// A latch that starts closed and opens exactly once.
///
/// Any number of tasks may [`wait`](Self::wait); all are released when the
/// gate is [`resolve`](Self::resolve)d, and later waiters pass straight
/// through.
#[derive(Debug)]
pub struct StartGate {
    tx: watch::Sender<bool>,
}

impl StartGate {
    /// Create a closed gate.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Whether the gate has been opened.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        *self.tx.borrow()
    }

    /// Open the gate, releasing every waiter.
    ///
    /// Returns `false` if the gate was already open.
    pub fn resolve(&self) -> bool {
        self.tx.send_if_modified(|resolved| {
            if *resolved {
                false
            } else {
                *resolved = true;
                true
            }
        })
    }

    /// Wait until the gate is open.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns once open.
        let _ = rx.wait_for(|resolved| *resolved).await;
    }
}

impl Default for StartGate {
    fn default() -> Self {
        Self::new()
    }
}
