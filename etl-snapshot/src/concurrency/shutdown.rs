use tokio::sync::watch;

use crate::concurrency::signal::{SignalRx, SignalTx, create_signal};

/// Broadcasts a shutdown request to every task holding a [`ShutdownRx`].
#[derive(Debug, Clone)]
pub struct ShutdownTx(SignalTx);

impl ShutdownTx {
    pub fn wrap(tx: SignalTx) -> Self {
        Self(tx)
    }

    /// Requests shutdown.
    ///
    /// Fails only when every receiver has already been dropped, which means there is nothing
    /// left to shut down.
    pub fn shutdown(&self) -> Result<(), watch::error::SendError<()>> {
        self.0.send(())
    }

    pub fn subscribe(&self) -> ShutdownRx {
        self.0.subscribe()
    }
}

pub type ShutdownRx = SignalRx;

pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = create_signal();
    (ShutdownTx::wrap(tx), rx)
}
