//! Shutdown signalling for background tasks.
//!
//! Every long-lived loop and every mongering wait selects on a [`Shutdown`]
//! so a node can stop without relying on process exit.

use tokio::sync::watch;

/// Creates a connected trigger/listener pair.
#[must_use]
pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Sending half: requests shutdown of every subscribed task.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Requests shutdown.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Returns a new listener.
    #[must_use]
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Listening half, cheap to clone into each task.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Returns true once shutdown has been requested.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves when shutdown is requested or the trigger is dropped.
    pub async fn requested(&mut self) {
        // An error means the trigger is gone, which is as final as a request.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}
