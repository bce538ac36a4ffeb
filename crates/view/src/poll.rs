use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Identifies one scheduled refresh, so a firing that was cancelled or
/// replaced in the meantime can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket(u64);

/// Arms at most one delayed refresh at a time.
///
/// A firing is delivered as a [`PollTicket`] on the receiver returned by
/// [`PollScheduler::new`]. The pending timer task is aborted on
/// [`cancel`](Self::cancel), on reschedule, and when the scheduler is dropped.
pub struct PollScheduler {
    delay: Duration,
    tx: mpsc::UnboundedSender<PollTicket>,
    issued: u64,
    pending: Option<(PollTicket, JoinHandle<()>)>,
}

impl PollScheduler {
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<PollTicket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            delay,
            tx,
            issued: 0,
            pending: None,
        };
        (scheduler, rx)
    }

    /// Arrange one firing after the fixed delay and return immediately.
    /// Replaces any refresh that is still pending.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule_refresh(&mut self) -> PollTicket {
        self.cancel();
        self.issued += 1;
        let ticket = PollTicket(self.issued);
        let tx = self.tx.clone();
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the view was torn down; nothing to do.
            let _ = tx.send(ticket);
        });
        debug!("Refresh scheduled in {}ms", delay.as_millis());
        self.pending = Some((ticket, handle));
        ticket
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        if let Some((ticket, handle)) = self.pending.take() {
            handle.abort();
            debug!("Refresh {ticket:?} cancelled");
        }
    }

    /// Claim a delivered firing. Returns `false` for stale tickets.
    pub fn take_fired(&mut self, ticket: PollTicket) -> bool {
        match &self.pending {
            Some((current, _)) if *current == ticket => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_the_delay() {
        let (mut poller, mut rx) = PollScheduler::new(Duration::from_secs(3));
        let ticket = poller.schedule_refresh();
        assert!(poller.is_pending());

        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert!(rx.try_recv().is_err());

        let fired = rx.recv().await.expect("poll should fire");
        assert_eq!(fired, ticket);
        assert!(poller.take_fired(fired));
        assert!(!poller.is_pending());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_the_pending_refresh() {
        let (mut poller, mut rx) = PollScheduler::new(Duration::from_secs(3));
        let first = poller.schedule_refresh();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let second = poller.schedule_refresh();

        let fired = rx.recv().await.expect("poll should fire");
        assert_eq!(fired, second);
        assert!(!poller.take_fired(first));
        assert!(poller.take_fired(second));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_refresh_never_fires() {
        let (mut poller, mut rx) = PollScheduler::new(Duration::from_secs(3));
        poller.schedule_refresh();
        poller.cancel();
        assert!(!poller.is_pending());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_scheduler_cancels_the_refresh() {
        let (mut poller, mut rx) = PollScheduler::new(Duration::from_secs(3));
        poller.schedule_refresh();
        drop(poller);

        tokio::time::sleep(Duration::from_secs(10)).await;
        // Sender side is gone and nothing was queued.
        assert!(rx.recv().await.is_none());
    }
}
