use tokio::sync::watch;
use tokio::time::Instant;

/// Cancellation handed to the request executor with every call.
///
/// Fires only when a stop outlives its grace period; in-flight calls should
/// give up as soon as it does.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires, for callers running requests outside an
    /// executor.
    #[must_use]
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested.
    pub async fn cancelled(&mut self) {
        let closed = self.rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// Stop, abort, and deadline state shared by the supervisor and workers.
pub(super) struct RunControl {
    stop_tx: watch::Sender<bool>,
    abort_tx: watch::Sender<bool>,
    deadline: Option<Instant>,
}

impl RunControl {
    pub(super) fn new(deadline: Option<Instant>) -> Self {
        let (stop_tx, _) = watch::channel(false);
        let (abort_tx, _) = watch::channel(false);
        Self {
            stop_tx,
            abort_tx,
            deadline,
        }
    }

    /// Returns true for the call that flipped the flag.
    pub(super) fn request_stop(&self) -> bool {
        !self.stop_tx.send_replace(true)
    }

    pub(super) fn abort(&self) {
        self.abort_tx.send_replace(true);
    }

    pub(super) fn is_stop_requested(&self) -> bool {
        *self.stop_tx.borrow()
    }

    pub(super) fn is_aborted(&self) -> bool {
        *self.abort_tx.borrow()
    }

    pub(super) fn deadline_passed(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Checked by workers before every budget claim.
    pub(super) fn should_stop_claiming(&self) -> bool {
        self.is_stop_requested() || self.is_aborted() || self.deadline_passed()
    }

    pub(super) fn stop_receiver(&self) -> watch::Receiver<bool> {
        self.stop_tx.subscribe()
    }

    pub(super) fn cancel_signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.abort_tx.subscribe(),
        }
    }
}
