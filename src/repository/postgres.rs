use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    clock::Clock,
    domain::{Backup, BackupRow, Host, HostId, HostRow, MaintenanceTask, MaintenanceTaskRow},
    repository::{BackupRepository, HostRepository, MaintenanceTaskRepository},
};

/// Task store backed by the `maintenance_tasks` table
pub struct PgMaintenanceTaskRepository {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgMaintenanceTaskRepository {
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl MaintenanceTaskRepository for PgMaintenanceTaskRepository {
    #[tracing::instrument(
        name = "repository::save_maintenance_task",
        skip_all,
        fields(task_id = %task.id())
    )]
    async fn save(&self, task: &MaintenanceTask) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO maintenance_tasks
                (id, name, type, schedule, next_run_at, last_run_at, enabled,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                type = EXCLUDED.type,
                schedule = EXCLUDED.schedule,
                next_run_at = EXCLUDED.next_run_at,
                last_run_at = EXCLUDED.last_run_at,
                enabled = EXCLUDED.enabled,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(task.id())
        .bind(task.name())
        .bind(task.kind().as_str())
        .bind(task.schedule())
        .bind(task.next_run_at())
        .bind(task.last_run_at())
        .bind(task.enabled())
        .bind(task.created_at())
        .bind(task.updated_at())
        .execute(&self.pool)
        .await
        .context("DB upsert maintenance task query failed")?;

        Ok(())
    }

    #[tracing::instrument(name = "repository::find_all_maintenance_tasks", skip(self))]
    async fn find_all(&self) -> Result<Vec<MaintenanceTask>> {
        let rows = sqlx::query_as::<_, MaintenanceTaskRow>(
            r#"
            SELECT id, name, type, schedule, next_run_at, last_run_at, enabled,
                   created_at, updated_at
            FROM maintenance_tasks
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("DB select maintenance tasks query failed")?;

        Ok(rows.into_iter().map(MaintenanceTask::restore).collect())
    }

    #[tracing::instrument(name = "repository::find_due_maintenance_tasks", skip(self))]
    async fn find_due_tasks(&self) -> Result<Vec<MaintenanceTask>> {
        let rows = sqlx::query_as::<_, MaintenanceTaskRow>(
            r#"
            SELECT id, name, type, schedule, next_run_at, last_run_at, enabled,
                   created_at, updated_at
            FROM maintenance_tasks
            WHERE enabled = TRUE AND (next_run_at IS NULL OR next_run_at <= $1)
            ORDER BY next_run_at ASC NULLS FIRST
            "#,
        )
        .bind(self.clock.now())
        .fetch_all(&self.pool)
        .await
        .context("DB select due maintenance tasks query failed")?;

        Ok(rows.into_iter().map(MaintenanceTask::restore).collect())
    }
}

/// Backup catalogue read from the `backups` table
pub struct PgBackupRepository {
    pool: PgPool,
}

impl PgBackupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BackupRepository for PgBackupRepository {
    #[tracing::instrument(name = "repository::find_all_backups", skip(self))]
    async fn find_all(&self) -> Result<Vec<Backup>> {
        let rows = sqlx::query_as::<_, BackupRow>(
            r#"
            SELECT id, host_id, path, destination, incremental, retention
            FROM backups
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("DB select backups query failed")?;

        Ok(rows.into_iter().map(Backup::from).collect())
    }
}

/// Host catalogue read from the `hosts` table
pub struct PgHostRepository {
    pool: PgPool,
}

impl PgHostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HostRepository for PgHostRepository {
    #[tracing::instrument(name = "repository::find_host", skip(self))]
    async fn find_by_id(&self, id: HostId) -> Result<Option<Host>> {
        let row = sqlx::query_as::<_, HostRow>(
            r#"
            SELECT id, hostname, "user", port, host_path
            FROM hosts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("DB select host query failed")?;

        row.map(|row| {
            let id = row.id;
            Host::try_from(row).with_context(|| format!("Host {id} has an invalid port"))
        })
        .transpose()
    }
}
