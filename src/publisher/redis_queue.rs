use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};

use crate::{
    domain::Backup,
    publisher::{MaintenancePublisher, PurgeWorkItem},
    repository::HostRepository,
};

/// Pushes work items as JSON onto a Redis list
pub struct RedisPublisher {
    conn: MultiplexedConnection,
    queue: String,
    hosts: Arc<dyn HostRepository>,
}

impl RedisPublisher {
    pub async fn connect(
        redis_url: &str,
        queue: impl Into<String>,
        hosts: Arc<dyn HostRepository>,
    ) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Invalid redis url")?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to redis")?;

        Ok(Self {
            conn,
            queue: queue.into(),
            hosts,
        })
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }
}

#[async_trait]
impl MaintenancePublisher for RedisPublisher {
    #[tracing::instrument(
        name = "publisher::redis_purge",
        skip_all,
        fields(backup_id = %backup.id())
    )]
    async fn publish_purge_task(&self, backup: &Backup) -> Result<()> {
        let item = PurgeWorkItem::resolve(backup, self.hosts.as_ref()).await?;
        let payload = serde_json::to_string(&item).context("Failed to serialize purge task")?;

        // multiplexed connections are cheap to clone and share one socket
        let mut conn = self.conn.clone();
        let _: () = conn
            .rpush(self.queue.as_str(), payload)
            .await
            .context("Failed to push purge task to redis")?;

        tracing::debug!(job_id = %item.job_id, queue = %self.queue, "Purge task pushed");

        Ok(())
    }
}
