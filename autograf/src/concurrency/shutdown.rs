//! Shutdown signaling between the service binary and the orchestrator loop.

use tokio::sync::watch;

/// Sending half of the shutdown channel.
///
/// Cloneable so that multiple components (signal handlers, tests) can trigger
/// the same shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<()>);

impl ShutdownTx {
    /// Signals shutdown to all subscribed receivers.
    pub fn shutdown(&self) -> Result<(), watch::error::SendError<()>> {
        self.0.send(())
    }

    /// Creates a new receiver subscribed to this sender.
    pub fn subscribe(&self) -> ShutdownRx {
        self.0.subscribe()
    }
}

/// Receiving half of the shutdown channel.
pub type ShutdownRx = watch::Receiver<()>;

/// Creates a connected shutdown channel pair.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(());

    (ShutdownTx(tx), rx)
}
