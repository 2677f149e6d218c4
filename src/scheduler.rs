use std::time::Duration;

use tokio::{
    task::JoinSet,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

pub type Task = (&'static str, anyhow::Result<()>);

/// Periodic driver for background loops
///
/// Every spawned loop shares one cancellation token which is also handed to
/// each run, so in-flight work can bail out on shutdown.
pub struct Scheduler {
    cancel_token: CancellationToken,
    tasks: JoinSet<Task>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token cancelled on shutdown
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Spawns a background task, immediately running it at provided interval
    ///
    /// Runs never overlap: a run that outlasts the interval swallows the missed
    /// ticks. A failed run is logged and the loop keeps going until cancelled.
    pub fn spawn_task<P, F, Fut>(
        &mut self,
        every: Duration,
        name: &'static str,
        params: P,
        mut task: F,
    ) where
        P: Clone + Send + Sync + 'static,
        F: FnMut(P, CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let cancel = self.cancel_token.clone();
        self.tasks.spawn(async move {
            let mut interval = time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(e) = task(params.clone(), cancel.clone()).await {
                            if cancel.is_cancelled() {
                                break;
                            }
                            tracing::error!(error = %e, "Task {name} failed");
                        }
                    }
                }
            }

            (name, Ok(()))
        });
    }

    /// Cancels all tasks and waits for them to finish within `timeout`
    ///
    /// Note: upon timeout, remaining tasks are NOT aborted nor drained
    /// (the app is expected to quit right after)
    pub async fn shutdown(mut self, timeout: Duration) {
        self.cancel_token.cancel();

        let deadline = Instant::now() + timeout;

        // drain tasks until timeout
        while !self.tasks.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::error!("Scheduler timed out when shutting down");
                break;
            }

            match time::timeout(remaining, self.tasks.join_next()).await {
                Ok(Some(join_result)) => match join_result {
                    Ok((name, Ok(()))) => {
                        tracing::info!("Task {name} finished successfully");
                    }
                    Ok((name, Err(e))) => {
                        tracing::error!(error = %e, "Task {name} error");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Task join error");
                    }
                },
                // no tasks left
                Ok(None) => break,
                Err(_) => {
                    tracing::error!("Scheduler timed out when shutting down");
                    break;
                }
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            cancel_token: CancellationToken::new(),
            tasks: JoinSet::new(),
        }
    }
}
