use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// Repeating tick source for the chat repaint. The first tick fires immediately.
pub struct RefreshTimer {
    cancel_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RefreshTimer {
    pub fn spawn(period: Duration) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            log::debug!("Refresh timer started ({:?})", period);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if tick_tx.send(()).is_err() {
                            break;
                        }
                    }
                    changed = cancel_rx.changed() => {
                        if changed.is_err() || *cancel_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            log::debug!("Refresh timer stopped");
        });

        (Self { cancel_tx, handle }, tick_rx)
    }

    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel and wait for the task to wind down.
    pub async fn shutdown(self) {
        self.cancel();
        let _ = self.handle.await;
    }
}
