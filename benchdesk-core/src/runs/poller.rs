//! Repeating run-status poll bound to the lifetime of a [`StatusPoller`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::Result;

use super::client::{RunClient, RunHandle};
use super::status::RunStatus;

/// Latest state observed by a poller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollSnapshot {
    /// Most recent status fetched successfully
    pub status: Option<RunStatus>,
    /// Polls that failed and were skipped
    pub failures: u32,
    /// Set once a finished status was observed; no polls follow it
    pub finished: bool,
}

/// Background task polling a run's status on a fixed interval.
///
/// Each tick awaits one poll before the next tick is taken, so polls never
/// overlap. The task ends on its own once a finished status is seen and is
/// aborted by [`StatusPoller::stop`] or when the poller is dropped.
pub struct StatusPoller {
    task: JoinHandle<()>,
    state: watch::Receiver<PollSnapshot>,
}

impl StatusPoller {
    /// Start polling with `poll` every `interval`. Must be called inside a tokio runtime.
    pub fn spawn<F, Fut>(interval: Duration, mut poll: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<RunStatus>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(PollSnapshot::default());

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match poll().await {
                    Ok(status) => {
                        let finished = status.is_finished();
                        tx.send_modify(|snapshot| {
                            snapshot.status = Some(status);
                            snapshot.finished = finished;
                        });
                        if finished {
                            tracing::info!("Run finished, polling stopped");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Run status poll failed, retrying next tick");
                        tx.send_modify(|snapshot| snapshot.failures += 1);
                    }
                }
            }
        });

        Self { task, state: rx }
    }

    /// Poll `handle` through `client`.
    pub fn for_run(client: Arc<RunClient>, handle: RunHandle, interval: Duration) -> Self {
        let handle = Arc::new(handle);
        Self::spawn(interval, move || {
            let client = Arc::clone(&client);
            let handle = Arc::clone(&handle);
            async move { client.poll(&handle).await }
        })
    }

    /// Snapshot of the latest state.
    pub fn latest(&self) -> PollSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.state.borrow().finished
    }

    /// True while the background task is alive.
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Wait until a finished status is observed.
    ///
    /// Returns `None` if polling was stopped first.
    pub async fn finished(&mut self) -> Option<RunStatus> {
        let snapshot = self.state.wait_for(|s| s.finished).await.ok()?;
        snapshot.status.clone()
    }

    /// Cancel polling. Safe to call more than once.
    pub fn stop(&self) {
        if !self.task.is_finished() {
            tracing::debug!("Stopping run status poller");
        }
        self.task.abort();
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::runs::status::TaskSourceProgress;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn status(completed: u64) -> RunStatus {
        let mut status = RunStatus::default();
        status.progress.insert(
            "java-tasks".into(),
            TaskSourceProgress {
                total: 3,
                completed,
                ..Default::default()
            },
        );
        status
    }

    fn counting(
        calls: &Arc<AtomicUsize>,
        script: fn(usize) -> Result<RunStatus>,
    ) -> impl FnMut() -> std::future::Ready<Result<RunStatus>> + Send + 'static {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(script(n))
        }
    }

    #[tokio::test]
    async fn test_stops_after_finished_status() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller = StatusPoller::spawn(
            Duration::from_millis(5),
            counting(&calls, |n| Ok(status((n as u64).min(3)))),
        );

        let finished = poller.finished().await.unwrap();
        assert!(finished.is_finished());
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(!poller.is_running());
        assert!(poller.is_finished());
    }

    #[tokio::test]
    async fn test_poll_failure_is_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller = StatusPoller::spawn(
            Duration::from_millis(5),
            counting(&calls, |n| {
                if n == 0 {
                    Err(Error::RunService("connection refused".into()))
                } else {
                    Ok(status(3))
                }
            }),
        );

        assert!(poller.finished().await.is_some());
        let snapshot = poller.latest();
        assert_eq!(snapshot.failures, 1);
        assert_eq!(snapshot.status, Some(status(3)));
    }

    #[tokio::test]
    async fn test_drop_cancels_polling() {
        let calls = Arc::new(AtomicUsize::new(0));
        let poller = StatusPoller::spawn(
            Duration::from_millis(5),
            counting(&calls, |_| Ok(status(1))),
        );
        let mut updates = poller.subscribe();
        updates.changed().await.unwrap();
        drop(poller);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_drop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_drop);
    }

    #[tokio::test]
    async fn test_stop_before_finish() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller = StatusPoller::spawn(
            Duration::from_millis(5),
            counting(&calls, |_| Ok(status(0))),
        );
        poller.stop();
        assert!(poller.finished().await.is_none());
        assert!(!poller.is_finished());
    }

    #[tokio::test]
    async fn test_for_run_stops_after_server_reports_finished() {
        use crate::config::RunServiceConfig;
        use crate::runs::test_server::{TestServer, FINISHED, IN_PROGRESS};

        crate::logging::init_test();
        let server = TestServer::start(&[IN_PROGRESS, IN_PROGRESS, FINISHED]).await;
        let client = RunClient::new(&RunServiceConfig {
            server_url: server.base_url.clone(),
            timeout_secs: 5,
            ..Default::default()
        })
        .unwrap();
        let handle = client
            .start("nightly.yaml", &["java-basic.yaml".to_string()], "out.yaml")
            .await
            .unwrap();

        let mut poller = StatusPoller::for_run(Arc::new(client), handle, Duration::from_millis(10));
        let finished = tokio::time::timeout(Duration::from_secs(10), poller.finished())
            .await
            .expect("run never finished")
            .unwrap();
        let totals = finished.totals();
        assert_eq!((totals.completed, totals.error), (2, 1));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!poller.is_running());
        assert_eq!(poller.latest().failures, 0);

        let polls = server
            .requests()
            .iter()
            .filter(|r| r.starts_with("GET /api/benchmark/status/"))
            .count();
        assert_eq!(polls, 3);
    }
}
