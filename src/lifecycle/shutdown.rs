//! Shutdown coordination.
//!
//! One `Shutdown` lives in the binary (or test) that owns the server. Every
//! server it starts holds a `ShutdownSignal`. Triggering, or dropping the
//! `Shutdown`, releases all of them.

use tokio::sync::broadcast;

/// Owner side of the shutdown channel.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A signal that completes once shutdown is triggered.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Release every outstanding signal. Returns how many were waiting.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Waiting side of the shutdown channel.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: broadcast::Receiver<()>,
}

impl ShutdownSignal {
    /// Wait until shutdown is triggered or its owner is gone.
    pub async fn wait(mut self) {
        // A closed channel means the owner was dropped, which also stops us.
        let _ = self.rx.recv().await;
    }
}
