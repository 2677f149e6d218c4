use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use anyhow::{Result, bail};
use async_trait::async_trait;
use backup_maintenance::{
    clock::Clock,
    domain::{Backup, MaintenanceTask},
    repository::{BackupRepository, MaintenanceTaskRepository, MemoryMaintenanceTaskRepository},
};

/// In-memory task store that counts writes and can be told to fail
pub struct RecordingTaskRepository {
    inner: MemoryMaintenanceTaskRepository,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
    fail_due: AtomicBool,
}

impl RecordingTaskRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: MemoryMaintenanceTaskRepository::new(clock),
            saves: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
            fail_due: AtomicBool::new(false),
        }
    }

    /// Put a task in place without counting it as a save
    pub async fn seed(&self, task: &MaintenanceTask) {
        self.inner.save(task).await.unwrap();
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    pub fn fail_due(&self) {
        self.fail_due.store(true, Ordering::SeqCst);
    }

    pub async fn get(&self, task: &MaintenanceTask) -> MaintenanceTask {
        self.inner
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .find(|t| t.id() == task.id())
            .expect("task should be stored")
    }
}

#[async_trait]
impl MaintenanceTaskRepository for RecordingTaskRepository {
    async fn save(&self, task: &MaintenanceTask) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            bail!("disk full");
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(task).await
    }

    async fn find_all(&self) -> Result<Vec<MaintenanceTask>> {
        self.inner.find_all().await
    }

    async fn find_due_tasks(&self) -> Result<Vec<MaintenanceTask>> {
        if self.fail_due.load(Ordering::SeqCst) {
            bail!("connection refused");
        }
        self.inner.find_due_tasks().await
    }
}

pub struct FailingBackupRepository;

#[async_trait]
impl BackupRepository for FailingBackupRepository {
    async fn find_all(&self) -> Result<Vec<Backup>> {
        bail!("backups table is locked")
    }
}
