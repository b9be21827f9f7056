//! Shutdown coordination.

use tokio::sync::broadcast;

use crate::lifecycle::signals::shutdown_signal;

/// Coordinator for graceful shutdown.
///
/// The server subscribes once; tests (or an embedding application) call
/// `trigger` instead of sending a signal.
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

    /// Ask every subscriber to stop.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve on an OS signal or when `rx` fires (or its sender is gone).
pub async fn until_shutdown(mut rx: broadcast::Receiver<()>) {
    tokio::select! {
        _ = shutdown_signal() => {}
        _ = rx.recv() => tracing::info!("Shutdown requested"),
    }
}
