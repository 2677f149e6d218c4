mod channel;
mod redis_queue;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{Backup, BackupId, Host},
    repository::HostRepository,
};

pub use channel::ChannelPublisher;
pub use redis_queue::RedisPublisher;

/// Hands purge work to whoever executes it (a worker pool behind a queue)
#[async_trait]
pub trait MaintenancePublisher: Send + Sync {
    /// Enqueue a purge of the given backup. Returns once the item is accepted
    /// by the channel, not when the purge is done.
    async fn publish_purge_task(&self, backup: &Backup) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemKind {
    Purge,
}

/// Wire format of a purge request as consumed by workers
///
/// `host_path` is the root the host's backups live under; workers join it
/// with `destination` to find the snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeWorkItem {
    #[serde(rename = "type")]
    pub kind: WorkItemKind,
    pub task_id: Uuid,
    pub job_id: Uuid,
    pub backup_id: BackupId,
    pub host: String,
    pub user: String,
    pub port: u16,
    pub path: String,
    pub destination: String,
    pub host_path: String,
    pub incremental: bool,
    pub retention: u32,
}

impl PurgeWorkItem {
    pub fn new(backup: &Backup, host: &Host) -> Self {
        Self {
            kind: WorkItemKind::Purge,
            task_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            backup_id: backup.id(),
            host: host.hostname().to_string(),
            user: host.user().to_string(),
            port: host.port(),
            path: backup.path().to_string(),
            destination: backup.destination().to_string(),
            host_path: host.path().to_string(),
            incremental: backup.incremental(),
            retention: backup.retention(),
        }
    }

    /// Look up the backup's host and build the item; a missing host is an error
    pub async fn resolve(backup: &Backup, hosts: &dyn HostRepository) -> Result<Self> {
        let host = hosts
            .find_by_id(backup.host_id())
            .await
            .context("Failed to get host")?
            .with_context(|| {
                format!("Host {} of backup {} not found", backup.host_id(), backup.id())
            })?;

        Ok(Self::new(backup, &host))
    }
}
