use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::{
    clock::Clock,
    domain::{Backup, BackupId, Host, HostId, MaintenanceTask, TaskId},
    repository::{BackupRepository, HostRepository, MaintenanceTaskRepository},
};

/// In-process task store, used when no database is configured
pub struct MemoryMaintenanceTaskRepository {
    tasks: RwLock<HashMap<TaskId, MaintenanceTask>>,
    clock: Arc<dyn Clock>,
}

impl MemoryMaintenanceTaskRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            clock,
        }
    }
}

#[async_trait]
impl MaintenanceTaskRepository for MemoryMaintenanceTaskRepository {
    async fn save(&self, task: &MaintenanceTask) -> Result<()> {
        self.tasks.write().await.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<MaintenanceTask>> {
        Ok(self.tasks.read().await.values().cloned().collect())
    }

    async fn find_due_tasks(&self) -> Result<Vec<MaintenanceTask>> {
        let now = self.clock.now();

        let mut due: Vec<MaintenanceTask> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|task| task.is_due(now))
            .cloned()
            .collect();
        due.sort_by_key(|task| task.next_run_at());

        Ok(due)
    }
}

/// In-process backup catalogue
#[derive(Default)]
pub struct MemoryBackupRepository {
    backups: DashMap<BackupId, Backup>,
}

impl MemoryBackupRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, backup: Backup) {
        self.backups.insert(backup.id(), backup);
    }
}

#[async_trait]
impl BackupRepository for MemoryBackupRepository {
    async fn find_all(&self) -> Result<Vec<Backup>> {
        Ok(self
            .backups
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}

/// In-process host catalogue
#[derive(Default)]
pub struct MemoryHostRepository {
    hosts: DashMap<HostId, Host>,
}

impl MemoryHostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, host: Host) {
        self.hosts.insert(host.id(), host);
    }
}

#[async_trait]
impl HostRepository for MemoryHostRepository {
    async fn find_by_id(&self, id: HostId) -> Result<Option<Host>> {
        Ok(self.hosts.get(&id).map(|entry| entry.value().clone()))
    }
}
