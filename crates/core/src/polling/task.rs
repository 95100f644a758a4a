use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// What a tick wants the task to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Stop,
}

/// A periodic tokio task.
///
/// Ticks run one at a time: a slow tick delays the next one instead of
/// overlapping with it. The task is cancelled when the handle is dropped.
pub struct PollTask {
    name: String,
    handle: Option<JoinHandle<()>>,
}

impl PollTask {
    /// Spawn a task whose first tick fires one period from now.
    pub fn spawn<F, Fut>(name: impl Into<String>, period: Duration, tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TickOutcome> + Send + 'static,
    {
        Self::spawn_at(name.into(), period, false, tick)
    }

    /// Spawn a task whose first tick fires immediately.
    pub fn spawn_immediate<F, Fut>(name: impl Into<String>, period: Duration, tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TickOutcome> + Send + 'static,
    {
        Self::spawn_at(name.into(), period, true, tick)
    }

    fn spawn_at<F, Fut>(name: String, period: Duration, immediate: bool, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = TickOutcome> + Send + 'static,
    {
        // tokio panics on a zero period
        let period = period.max(Duration::from_millis(1));
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            let start = if immediate {
                Instant::now()
            } else {
                Instant::now() + period
            };
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if tick().await == TickOutcome::Stop {
                    debug!(task = %task_name, "poll task stopped itself");
                    break;
                }
            }
        });

        debug!(task = %name, period_ms = period.as_millis() as u64, immediate, "poll task started");
        Self {
            name,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cancel the task. A tick in progress is dropped at its next await point.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!(task = %self.name, "poll task cancelled");
        }
    }

    /// Cancel the task and wait until it has fully unwound.
    ///
    /// Once this returns no tick of this task can run again.
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // Cancellation surfaces as a JoinError; both outcomes mean the task is gone.
            let _ = handle.await;
            debug!(task = %self.name, "poll task shut down");
        }
    }

    /// Whether the task has ended, either by returning `Stop` or by cancellation.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for PollTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollTask")
            .field("name", &self.name)
            .field("finished", &self.is_finished())
            .finish()
    }
}
