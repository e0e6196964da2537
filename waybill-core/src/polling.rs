//! Fixed-interval polling
//!
//! Each tick runs as its own task: a slow or failed tick never delays or
//! cancels the next one, and overlapping ticks are allowed. Results land in a
//! watch channel, so whichever fetch finishes last wins.

use crate::error::WaybillResult;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

/// Handle to a running poller. Dropping it stops scheduling new ticks.
#[derive(Debug)]
pub struct PollerHandle<T> {
    name: &'static str,
    receiver: watch::Receiver<Option<T>>,
    task: JoinHandle<()>,
}

impl<T> PollerHandle<T> {
    /// Most recent successful result, if any tick has succeeded yet
    pub fn latest(&self) -> Option<T>
    where
        T: Clone,
    {
        self.receiver.borrow().clone()
    }

    /// A receiver that is notified every time a tick publishes a value
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.receiver.clone()
    }

    /// Stop scheduling ticks. Ticks already in flight still finish.
    pub fn stop(&self) {
        if !self.task.is_finished() {
            debug!(poller = self.name, "Stopping poller");
            self.task.abort();
        }
    }
}

impl<T> Drop for PollerHandle<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `fetch` every `period`, starting immediately.
pub fn spawn_poller<T, F, Fut>(name: &'static str, period: Duration, fetch: F) -> PollerHandle<T>
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = WaybillResult<T>> + Send + 'static,
{
    let (sender, receiver) = watch::channel(None);
    let sender = Arc::new(sender);

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut tick: u64 = 0;

        loop {
            ticker.tick().await;
            if sender.is_closed() {
                debug!(poller = name, "No subscribers left, poller exiting");
                break;
            }

            tick += 1;
            let sender = Arc::clone(&sender);
            let fetch = fetch();
            tokio::spawn(async move {
                match fetch.await {
                    Ok(value) => {
                        sender.send_replace(Some(value));
                        debug!(poller = name, tick, "Poll tick published");
                    }
                    Err(error) => {
                        warn!(poller = name, tick, error = %error, "Poll tick failed");
                    }
                }
            });
        }
    });

    PollerHandle {
        name,
        receiver,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorContext, WaybillError};
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test]
    async fn test_failed_tick_does_not_stop_polling() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);

        let handle = spawn_poller("test", Duration::from_millis(10), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    Err(WaybillError::Network {
                        message: "connection refused".to_string(),
                        source: None,
                        context: ErrorContext::new("test"),
                    })
                } else {
                    Ok(n)
                }
            }
        });

        let mut updates = handle.subscribe();
        tokio::time::timeout(Duration::from_secs(2), updates.changed())
            .await
            .expect("poller never published")
            .unwrap();

        assert!(handle.latest().unwrap() >= 2);
    }

    #[tokio::test]
    async fn test_slow_tick_does_not_block_next_tick() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);

        let handle = spawn_poller("slow", Duration::from_millis(10), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
                Ok(n)
            }
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(calls.load(Ordering::SeqCst) > 2);
        assert!(handle.latest().unwrap() >= 2);
    }

    #[tokio::test]
    async fn test_stop_halts_new_ticks() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&calls);

        let handle = spawn_poller("stoppable", Duration::from_millis(10), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_stop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_stop);
    }
}
