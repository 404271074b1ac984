//! Cancellation handle for a running install.

use tokio::sync::mpsc;

/// Requests delivered to a running install.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlMessage {
    Cancel,
}

/// Cloneable handle that aborts the active install.
///
/// Obtain one from [`Installer::canceller`](super::Installer::canceller)
/// before calling `install`, then call [`cancel`](Self::cancel) from any task,
/// thread, or signal handler. A request made while `install` is still
/// checking local files stops it before any transfer starts. Requests made
/// while no install is running are discarded when the next install starts.
#[derive(Debug, Clone)]
pub struct Canceller {
    tx: mpsc::UnboundedSender<ControlMessage>,
}

impl Canceller {
    /// Terminate every active transfer and skip the files not yet started.
    pub fn cancel(&self) {
        // The receiver lives as long as the installer.
        let _ = self.tx.send(ControlMessage::Cancel);
    }
}

/// Receiving side owned by the installer.
#[derive(Debug)]
pub(crate) struct ControlChannel {
    tx: mpsc::UnboundedSender<ControlMessage>,
    rx: mpsc::UnboundedReceiver<ControlMessage>,
}

impl ControlChannel {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub(crate) fn canceller(&self) -> Canceller {
        Canceller {
            tx: self.tx.clone(),
        }
    }

    /// Discard requests that arrived while nothing was running.
    pub(crate) fn drain_stale(&mut self) -> usize {
        let mut stale = 0;
        while self.rx.try_recv().is_ok() {
            stale += 1;
        }
        stale
    }

    /// Consume a request that arrived since the last drain.
    pub(crate) fn take_cancel(&mut self) -> bool {
        let mut cancelled = false;
        while let Ok(ControlMessage::Cancel) = self.rx.try_recv() {
            cancelled = true;
        }
        cancelled
    }

    pub(crate) async fn recv(&mut self) -> Option<ControlMessage> {
        self.rx.recv().await
    }
}
