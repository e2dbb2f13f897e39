//! Deferred callbacks for the computer's think-time.

use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// At most one pending callback, run after a fixed delay.
///
/// Scheduling again replaces the pending callback, and dropping the delay
/// cancels it, so a callback never fires against an abandoned match.
#[derive(Debug)]
pub struct TurnDelay {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl TurnDelay {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `callback` after the delay, cancelling anything still pending.
    pub fn schedule<F>(&mut self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            callback();
        }));
    }

    /// True while a callback is waiting to run.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the pending callback. Returns whether one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    /// Wait for the pending callback. Returns false if there was none or it
    /// was cancelled.
    pub async fn wait(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => handle.await.is_ok(),
            None => false,
        }
    }
}

impl Drop for TurnDelay {
    fn drop(&mut self) {
        self.cancel();
    }
}
