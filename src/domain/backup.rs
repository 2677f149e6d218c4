use uuid::Uuid;

use crate::domain::HostId;

pub type BackupId = Uuid;

/// A backup job definition owned by the backup subsystem
///
/// Maintenance only reads it to decide which backups get purge work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    id: BackupId,
    host_id: HostId,
    path: String,
    destination: String,
    incremental: bool,
    /// Number of snapshots to keep, 0 means keep everything
    retention: u32,
}

/// Row shape of the columns maintenance reads from `backups`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BackupRow {
    pub id: Uuid,
    pub host_id: Uuid,
    pub path: String,
    pub destination: String,
    pub incremental: bool,
    pub retention: i32,
}

impl Backup {
    pub fn new(
        id: BackupId,
        host_id: HostId,
        path: impl Into<String>,
        destination: impl Into<String>,
        incremental: bool,
        retention: u32,
    ) -> Self {
        Self {
            id,
            host_id,
            path: path.into(),
            destination: destination.into(),
            incremental,
            retention,
        }
    }

    pub fn id(&self) -> BackupId {
        self.id
    }

    pub fn host_id(&self) -> HostId {
        self.host_id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn incremental(&self) -> bool {
        self.incremental
    }

    pub fn retention(&self) -> u32 {
        self.retention
    }

    /// Incremental backups with a retention limit accumulate snapshots to purge
    pub fn is_purge_eligible(&self) -> bool {
        self.incremental && self.retention > 0
    }
}

impl From<BackupRow> for Backup {
    fn from(row: BackupRow) -> Self {
        // negative retention in the store means nothing sensible, treat as "keep all"
        let retention = u32::try_from(row.retention).unwrap_or(0);
        Self::new(
            row.id,
            row.host_id,
            row.path,
            row.destination,
            row.incremental,
            retention,
        )
    }
}
