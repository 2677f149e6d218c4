use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    domain::Backup,
    publisher::{MaintenancePublisher, PurgeWorkItem},
    repository::HostRepository,
};

/// In-process publisher over a bounded channel
///
/// Stands in for a broker when none is configured. Publishing waits for
/// capacity and fails once the receiving side is gone.
#[derive(Clone)]
pub struct ChannelPublisher {
    sender: mpsc::Sender<PurgeWorkItem>,
    hosts: Arc<dyn HostRepository>,
}

impl ChannelPublisher {
    pub fn new(
        capacity: usize,
        hosts: Arc<dyn HostRepository>,
    ) -> (Self, mpsc::Receiver<PurgeWorkItem>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender, hosts }, receiver)
    }
}

#[async_trait]
impl MaintenancePublisher for ChannelPublisher {
    async fn publish_purge_task(&self, backup: &Backup) -> Result<()> {
        let item = PurgeWorkItem::resolve(backup, self.hosts.as_ref()).await?;

        self.sender
            .send(item)
            .await
            .map_err(|_| anyhow!("purge task channel is closed"))
    }
}

#[cfg(test)]
mod test {
    use uuid::Uuid;

    use super::*;
    use crate::{domain::Host, repository::MemoryHostRepository};

    fn known_host(hosts: &MemoryHostRepository) -> Host {
        let host = Host::new(Uuid::new_v4(), "nas-01.lan", "backup", 22, "/volume1");
        hosts.insert(host.clone());
        host
    }

    #[tokio::test]
    async fn delivers_work_items() {
        let hosts = Arc::new(MemoryHostRepository::new());
        let host = known_host(&hosts);
        let (publisher, mut receiver) = ChannelPublisher::new(4, hosts);
        let backup = Backup::new(Uuid::new_v4(), host.id(), "/home", "nas/home", true, 3);

        publisher.publish_purge_task(&backup).await.unwrap();

        let item = receiver.recv().await.expect("an item");
        assert_eq!(item.backup_id, backup.id());
        assert_eq!(item.host, "nas-01.lan");
        assert_eq!(item.host_path, "/volume1");
        assert_eq!(item.retention, 3);
    }

    #[tokio::test]
    async fn unknown_host_is_an_error() {
        let (publisher, mut receiver) =
            ChannelPublisher::new(4, Arc::new(MemoryHostRepository::new()));
        let backup = Backup::new(Uuid::new_v4(), Uuid::new_v4(), "/home", "nas/home", true, 3);

        assert!(publisher.publish_purge_task(&backup).await.is_err());
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_channel_is_an_error() {
        let hosts = Arc::new(MemoryHostRepository::new());
        let host = known_host(&hosts);
        let (publisher, receiver) = ChannelPublisher::new(1, hosts);
        drop(receiver);

        let backup = Backup::new(Uuid::new_v4(), host.id(), "/home", "nas/home", true, 3);
        let result = publisher.publish_purge_task(&backup).await;
        assert!(result.is_err());
    }
}
