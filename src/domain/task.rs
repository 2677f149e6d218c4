use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    domain::{CronSchedule, ScheduleError},
    error::MaintenanceError,
};

pub type TaskId = Uuid;

/// What a maintenance task does when it fires
///
/// Kinds this build doesn't know about are kept verbatim so they survive a
/// load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Queue a purge of old incremental snapshots for every eligible backup
    Purge,
    Other(String),
}

impl TaskKind {
    pub fn as_str(&self) -> &str {
        match self {
            TaskKind::Purge => "purge",
            TaskKind::Other(kind) => kind,
        }
    }
}

impl From<String> for TaskKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "purge" => TaskKind::Purge,
            _ => TaskKind::Other(value),
        }
    }
}

impl From<&str> for TaskKind {
    fn from(value: &str) -> Self {
        value.to_string().into()
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row shape of a persisted maintenance task
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MaintenanceTaskRow {
    pub id: Uuid,
    pub name: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub schedule: String,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named recurring maintenance job with a cron schedule
#[derive(Debug, Clone, PartialEq)]
pub struct MaintenanceTask {
    id: TaskId,
    name: String,
    kind: TaskKind,
    schedule: String,
    next_run_at: Option<DateTime<Utc>>,
    last_run_at: Option<DateTime<Utc>>,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MaintenanceTask {
    /// Create a new enabled task, scheduled for its first firing after `now`
    pub fn create(
        name: &str,
        kind: TaskKind,
        schedule: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, MaintenanceError> {
        if name.trim().is_empty() {
            return Err(MaintenanceError::InvalidArgument("name is required"));
        }
        if schedule.trim().is_empty() {
            return Err(MaintenanceError::InvalidArgument("schedule is required"));
        }

        let mut task = Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind,
            schedule: schedule.to_string(),
            next_run_at: None,
            last_run_at: None,
            enabled: true,
            created_at: now,
            updated_at: now,
        };
        task.recompute_next_run(now)?;

        Ok(task)
    }

    /// Rebuild a task from storage as-is, without validation
    pub fn restore(row: MaintenanceTaskRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            kind: row.kind.into(),
            schedule: row.schedule,
            next_run_at: row.next_run_at,
            last_run_at: row.last_run_at,
            enabled: row.enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn schedule(&self) -> &str {
        &self.schedule
    }

    pub fn next_run_at(&self) -> Option<DateTime<Utc>> {
        self.next_run_at
    }

    pub fn last_run_at(&self) -> Option<DateTime<Utc>> {
        self.last_run_at
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Enabled and either never scheduled or scheduled at or before `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.next_run_at.is_none_or(|next| next <= now)
    }

    /// Set `next_run_at` to the first firing strictly after `now`
    ///
    /// Leaves `updated_at` alone; callers pair this with a mutation that stamps it.
    pub fn recompute_next_run(&mut self, now: DateTime<Utc>) -> Result<(), MaintenanceError> {
        let invalid = |source| MaintenanceError::InvalidSchedule {
            schedule: self.schedule.clone(),
            source,
        };

        let schedule = CronSchedule::parse(&self.schedule).map_err(invalid)?;
        let next = schedule
            .next_after(now)
            .ok_or(ScheduleError::Exhausted(now))
            .map_err(invalid)?;

        self.next_run_at = Some(next);
        Ok(())
    }

    /// Record an execution at `at`. Does not touch `next_run_at`.
    pub fn mark_executed(&mut self, at: DateTime<Utc>) {
        self.last_run_at = Some(at);
        self.updated_at = at;
    }

    pub fn set_enabled(&mut self, enabled: bool, now: DateTime<Utc>) {
        self.enabled = enabled;
        self.updated_at = now;
    }

    pub fn to_row(&self) -> MaintenanceTaskRow {
        MaintenanceTaskRow {
            id: self.id,
            name: self.name.clone(),
            kind: self.kind.as_str().to_string(),
            schedule: self.schedule.clone(),
            next_run_at: self.next_run_at,
            last_run_at: self.last_run_at,
            enabled: self.enabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
