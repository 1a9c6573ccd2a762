//! Periodic background tasks.
//!
//! Every poller in this crate runs as an independent tokio task owned by a
//! [`PollHandle`]. Stopping the handle, or dropping it, cancels the task;
//! a tick that is in flight when the task is cancelled is abandoned and its
//! result is never published.

mod config;

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

pub use config::{DEFAULT_POLL_INTERVAL, PollerConfig, PollerConfigBuilder};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Tracing target for periodic task lifecycle events.
const TRACING_TARGET: &str = "flowdesk_editor::poll";

/// Handle owning a periodic background task.
///
/// The task is cancelled when [`stop`](Self::stop) is called or the handle
/// is dropped.
#[derive(Debug)]
pub struct PollHandle {
    name: &'static str,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
    _guard: DropGuard,
}

impl PollHandle {
    /// Returns the name the task was spawned with.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Requests cancellation of the task.
    pub fn stop(&self) {
        if !self.cancel_token.is_cancelled() {
            tracing::debug!(target: TRACING_TARGET, poller = self.name, "Stopping poller");
        }
        self.cancel_token.cancel();
    }

    /// Returns whether the task has been stopped or has finished on its own.
    pub fn is_stopped(&self) -> bool {
        self.cancel_token.is_cancelled() || self.task.is_finished()
    }

    /// Waits for the task to exit.
    pub async fn join(self) {
        if let Err(err) = self.task.await
            && err.is_panic()
        {
            tracing::error!(
                target: TRACING_TARGET,
                poller = self.name,
                error = %err,
                "Poller panicked"
            );
        }
    }
}

/// Spawns a task that calls `tick` every `interval`.
///
/// The first tick runs immediately. A tick returning
/// [`ControlFlow::Break`] ends the task. Ticks never overlap: when a tick
/// takes longer than the interval, the next one is delayed.
pub fn spawn_periodic<F, Fut>(name: &'static str, interval: Duration, mut tick: F) -> PollHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ControlFlow<()>> + Send,
{
    let cancel_token = CancellationToken::new();
    let token = cancel_token.clone();

    tracing::debug!(
        target: TRACING_TARGET,
        poller = name,
        interval_ms = interval.as_millis(),
        "Starting poller"
    );

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let flow = tokio::select! {
                biased;
                () = token.cancelled() => break,
                flow = tick() => flow,
            };

            if flow.is_break() {
                tracing::debug!(target: TRACING_TARGET, poller = name, "Poller finished");
                break;
            }
        }
    });

    PollHandle {
        name,
        _guard: cancel_token.clone().drop_guard(),
        cancel_token,
        task,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting(counter: &Arc<AtomicUsize>, stop_after: Option<usize>) -> PollHandle {
        let counter = counter.clone();
        spawn_periodic("test", Duration::from_secs(2), move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                match stop_after {
                    Some(limit) if n >= limit => ControlFlow::Break(()),
                    _ => ControlFlow::Continue(()),
                }
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_interval() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = counting(&counter, None);

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        // Immediate tick plus two more at 2s and 4s.
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_ticks() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = counting(&counter, None);

        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.stop();
        assert!(handle.is_stopped());
        handle.join().await;

        let seen = counter.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let counter = Arc::new(AtomicUsize::new(0));
        drop(counting(&counter, None));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(counter.load(Ordering::SeqCst) <= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_break_ends_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = counting(&counter, Some(2));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(handle.is_stopped());
    }
}
