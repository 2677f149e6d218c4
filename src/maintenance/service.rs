use std::{future::Future, sync::Arc};

use tokio_util::sync::CancellationToken;

use crate::{
    clock::Clock,
    domain::{MaintenanceTask, TaskKind},
    error::MaintenanceError,
    publisher::MaintenancePublisher,
    repository::{BackupRepository, MaintenanceTaskRepository},
};

/// Dispatcher for recurring maintenance tasks
///
/// Each call to [`process_due_tasks`](Self::process_due_tasks) is one tick: it
/// runs every task that is due, then advances and persists its schedule.
/// Ticks must not overlap on one instance, and several instances sharing a
/// store will double-fire tasks.
pub struct MaintenanceService {
    repo: Arc<dyn MaintenanceTaskRepository>,
    backup_repo: Arc<dyn BackupRepository>,
    publisher: Arc<dyn MaintenancePublisher>,
    clock: Arc<dyn Clock>,
}

impl MaintenanceService {
    pub fn new(
        repo: Arc<dyn MaintenanceTaskRepository>,
        backup_repo: Arc<dyn BackupRepository>,
        publisher: Arc<dyn MaintenancePublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            backup_repo,
            publisher,
            clock,
        }
    }

    /// Run all due tasks once
    ///
    /// Only a failed due-task query or cancellation is reported. A task whose
    /// body fails is logged and left untouched so the next tick retries it.
    #[tracing::instrument(name = "maintenance::process_due_tasks", skip_all)]
    pub async fn process_due_tasks(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(), MaintenanceError> {
        let tasks = until_cancelled(cancel, self.repo.find_due_tasks())
            .await?
            .map_err(MaintenanceError::Repository)?;

        if tasks.is_empty() {
            tracing::debug!("No maintenance tasks due");
            return Ok(());
        }

        for mut task in tasks {
            if cancel.is_cancelled() {
                return Err(MaintenanceError::Cancelled);
            }

            tracing::info!(
                task_id = %task.id(),
                "Processing maintenance task: {} ({})",
                task.name(),
                task.kind()
            );

            match self.execute_task(&task, cancel).await {
                Ok(()) => {}
                Err(MaintenanceError::Cancelled) => return Err(MaintenanceError::Cancelled),
                Err(e) => {
                    tracing::error!(
                        task_id = %task.id(),
                        error = %e,
                        "Error executing maintenance task {}: {e}",
                        task.id()
                    );
                    continue;
                }
            }

            let now = self.clock.now();
            task.mark_executed(now);
            if let Err(e) = task.recompute_next_run(now) {
                tracing::error!(
                    task_id = %task.id(),
                    error = %e,
                    "Error calculating next run for task {}: {e}",
                    task.id()
                );
            }

            match until_cancelled(cancel, self.repo.save(&task)).await? {
                Ok(()) => {
                    tracing::debug!(
                        task_id = %task.id(),
                        next_run_at = ?task.next_run_at(),
                        "Maintenance task rescheduled"
                    );
                }
                Err(e) => {
                    let e = MaintenanceError::Repository(e);
                    tracing::error!(
                        task_id = %task.id(),
                        error = %e,
                        "Error saving maintenance task {}: {e}",
                        task.id()
                    );
                }
            }
        }

        Ok(())
    }

    async fn execute_task(
        &self,
        task: &MaintenanceTask,
        cancel: &CancellationToken,
    ) -> Result<(), MaintenanceError> {
        match task.kind() {
            TaskKind::Purge => self.purge_incremental_backups(cancel).await,
            TaskKind::Other(kind) => {
                tracing::warn!(task_id = %task.id(), "Unknown maintenance task type: {kind}");
                Ok(())
            }
        }
    }

    /// Queue a purge for every incremental backup that has a retention limit
    ///
    /// Publish failures are logged per backup and do not fail the task.
    async fn purge_incremental_backups(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(), MaintenanceError> {
        let backups = until_cancelled(cancel, self.backup_repo.find_all())
            .await?
            .map_err(MaintenanceError::BackupRepository)?;

        let mut queued = 0usize;
        let mut failed = 0usize;

        for backup in backups.iter().filter(|backup| backup.is_purge_eligible()) {
            tracing::info!(
                backup_id = %backup.id(),
                "Queueing purge task for backup: {} (retention: {})",
                backup.id(),
                backup.retention()
            );

            match until_cancelled(cancel, self.publisher.publish_purge_task(backup)).await? {
                Ok(()) => queued += 1,
                Err(e) => {
                    failed += 1;
                    let e = MaintenanceError::Publish(e);
                    tracing::error!(
                        backup_id = %backup.id(),
                        error = %e,
                        "Failed to publish purge task for backup {}: {e}",
                        backup.id()
                    );
                }
            }
        }

        tracing::info!(
            backups = backups.len(),
            eligible = queued + failed,
            queued,
            failed,
            "Purge fan-out finished"
        );

        Ok(())
    }
}

/// Race a boundary call against the caller's cancellation token
async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output, MaintenanceError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(MaintenanceError::Cancelled),
        output = fut => Ok(output),
    }
}
