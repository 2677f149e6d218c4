use std::{collections::HashSet, sync::Mutex};

use anyhow::{Result, bail};
use async_trait::async_trait;
use backup_maintenance::{
    domain::{Backup, BackupId},
    publisher::MaintenancePublisher,
};
use tokio_util::sync::CancellationToken;

/// Records every publish attempt and fails for selected backups
#[derive(Default)]
pub struct RecordingPublisher {
    attempts: Mutex<Vec<BackupId>>,
    fail_for: Mutex<HashSet<BackupId>>,
    /// Cancelled on the first publish, which then never completes
    hang_with: Option<CancellationToken>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hanging(cancel: CancellationToken) -> Self {
        Self {
            hang_with: Some(cancel),
            ..Self::default()
        }
    }

    pub fn fail_for(&self, id: BackupId) {
        self.fail_for.lock().unwrap().insert(id);
    }

    pub fn attempts(&self) -> Vec<BackupId> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<BackupId> {
        let fail_for = self.fail_for.lock().unwrap();
        self.attempts()
            .into_iter()
            .filter(|id| !fail_for.contains(id))
            .collect()
    }
}

#[async_trait]
impl MaintenancePublisher for RecordingPublisher {
    async fn publish_purge_task(&self, backup: &Backup) -> Result<()> {
        self.attempts.lock().unwrap().push(backup.id());

        if let Some(cancel) = &self.hang_with {
            cancel.cancel();
            std::future::pending::<()>().await;
        }

        if self.fail_for.lock().unwrap().contains(&backup.id()) {
            bail!("broker unavailable");
        }
        Ok(())
    }
}
