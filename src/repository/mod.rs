mod memory;
mod postgres;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{Backup, Host, HostId, MaintenanceTask};

pub use memory::{MemoryBackupRepository, MemoryHostRepository, MemoryMaintenanceTaskRepository};
pub use postgres::{PgBackupRepository, PgHostRepository, PgMaintenanceTaskRepository};

/// Durable set of maintenance tasks keyed by id
#[async_trait]
pub trait MaintenanceTaskRepository: Send + Sync {
    /// Insert or update by id
    async fn save(&self, task: &MaintenanceTask) -> Result<()>;

    async fn find_all(&self) -> Result<Vec<MaintenanceTask>>;

    /// Enabled tasks whose next run is unset or not in the future,
    /// oldest `next_run_at` first with unset ones leading
    async fn find_due_tasks(&self) -> Result<Vec<MaintenanceTask>>;
}

/// Read side of the backup catalogue
#[async_trait]
pub trait BackupRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<Backup>>;
}

/// Read side of the host catalogue
#[async_trait]
pub trait HostRepository: Send + Sync {
    /// `None` when no host has this id
    async fn find_by_id(&self, id: HostId) -> Result<Option<Host>>;
}
