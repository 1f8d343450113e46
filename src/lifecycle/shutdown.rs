//! Shutdown coordination.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, Instant};

/// Broadcasts a single shutdown signal to every background task.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Tasks still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Wait until every subscriber has dropped its receiver, or `deadline` passes.
    ///
    /// Returns whether all tasks finished in time.
    pub async fn drained(&self, deadline: Duration) -> bool {
        let until = Instant::now() + deadline;
        while self.receiver_count() > 0 {
            if Instant::now() >= until {
                tracing::warn!(remaining = self.receiver_count(), "Shutdown deadline reached with tasks still running");
                return false;
            }
            time::sleep(Duration::from_millis(20)).await;
        }
        true
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
