//! Cancellation signalling for long-running consume loops.
//!
//! A [`CancelHandle`] / [`CancelSignal`] pair threads a single caller-owned
//! stop signal through the projector, every blocked cursor read, and every
//! handler invocation. Firing the handle promptly wakes all suspended waits.

use tokio::sync::watch;

/// Create a connected cancellation handle and signal.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// Caller-side handle used to request cancellation.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Consumer-side signal observed by suspended operations.
///
/// `Clone` is cheap; every clone observes the same handle. If the handle is
/// dropped without firing, the signal never resolves.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Returns `true` once cancellation has been requested.
    pub fn is_canceled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until cancellation is requested.
    pub async fn canceled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without firing: cancellation can never
                // arrive, so this wait never resolves.
                std::future::pending::<()>().await;
            }
        }
    }
}
