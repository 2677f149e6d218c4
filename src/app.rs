use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use tokio::sync::mpsc;

use crate::{
    clock::{Clock, SystemClock},
    config::{Queue, Settings, Storage},
    domain::{MaintenanceTask, TaskKind},
    maintenance::MaintenanceService,
    publisher::{ChannelPublisher, MaintenancePublisher, PurgeWorkItem, RedisPublisher},
    repository::{
        BackupRepository, HostRepository, MaintenanceTaskRepository, MemoryBackupRepository,
        MemoryHostRepository, MemoryMaintenanceTaskRepository, PgBackupRepository,
        PgHostRepository, PgMaintenanceTaskRepository,
    },
    scheduler::Scheduler,
};

pub const PURGE_TASK_NAME: &str = "purge-incremental-backups";

const CHANNEL_CAPACITY: usize = 1024;

pub async fn connect_to_db(database_url: &str) -> Result<Pool<Postgres>> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;

    // Run SQL migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("SQL migrations failed")?;

    Ok(pool)
}

/// Make sure the default purge task exists
///
/// Tasks are matched by name; an existing one is left as it is, including its
/// schedule and enabled flag.
pub async fn seed_default_tasks(
    repo: &dyn MaintenanceTaskRepository,
    purge_schedule: &str,
    clock: &dyn Clock,
) -> Result<()> {
    let tasks = repo
        .find_all()
        .await
        .context("Failed to list maintenance tasks")?;

    if tasks.iter().any(|task| task.name() == PURGE_TASK_NAME) {
        tracing::info!("Seeding: '{PURGE_TASK_NAME}' task already exists");
        return Ok(());
    }

    let task =
        MaintenanceTask::create(PURGE_TASK_NAME, TaskKind::Purge, purge_schedule, clock.now())
            .context("Failed to create default purge task")?;
    repo.save(&task)
        .await
        .context("Failed to save default purge task")?;

    tracing::info!(
        task_id = %task.id(),
        schedule = purge_schedule,
        next_run_at = ?task.next_run_at(),
        "Seeding: created '{PURGE_TASK_NAME}' task"
    );

    Ok(())
}

/// Log work items that never leave the process
async fn drain_work_items(mut receiver: mpsc::Receiver<PurgeWorkItem>) {
    while let Some(item) = receiver.recv().await {
        tracing::info!(
            backup_id = %item.backup_id,
            host = %item.host,
            job_id = %item.job_id,
            retention = item.retention,
            "Purge task accepted (no broker configured, not forwarded)"
        );
    }
}

pub struct Components {
    pub repo: Arc<dyn MaintenanceTaskRepository>,
    pub service: Arc<MaintenanceService>,
}

/// Wire repositories, publisher and the service according to settings
pub async fn build(settings: &Settings, clock: Arc<dyn Clock>) -> Result<Components> {
    let repo: Arc<dyn MaintenanceTaskRepository>;
    let backup_repo: Arc<dyn BackupRepository>;
    let host_repo: Arc<dyn HostRepository>;

    match &settings.storage {
        Storage::Postgres(url) => {
            let pool = connect_to_db(url.as_str()).await?;
            tracing::info!("Using Postgres repositories");
            repo = Arc::new(PgMaintenanceTaskRepository::new(pool.clone(), clock.clone()));
            backup_repo = Arc::new(PgBackupRepository::new(pool.clone()));
            host_repo = Arc::new(PgHostRepository::new(pool));
        }
        Storage::Memory => {
            tracing::info!("Using in-memory repositories");
            repo = Arc::new(MemoryMaintenanceTaskRepository::new(clock.clone()));
            backup_repo = Arc::new(MemoryBackupRepository::new());
            host_repo = Arc::new(MemoryHostRepository::new());
        }
    }

    let publisher: Arc<dyn MaintenancePublisher> = match &settings.queue {
        Queue::Redis { url, name } => {
            let publisher = RedisPublisher::connect(url.as_str(), name.clone(), host_repo).await?;
            tracing::info!(queue = publisher.queue(), "Publishing purge tasks to redis");
            Arc::new(publisher)
        }
        Queue::Channel => {
            let (publisher, receiver) = ChannelPublisher::new(CHANNEL_CAPACITY, host_repo);
            tokio::spawn(drain_work_items(receiver));
            Arc::new(publisher)
        }
    };

    let service = Arc::new(MaintenanceService::new(
        repo.clone(),
        backup_repo,
        publisher,
        clock,
    ));

    Ok(Components { repo, service })
}

pub async fn run(settings: Settings) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let components = build(&settings, clock.clone()).await?;

    seed_default_tasks(components.repo.as_ref(), &settings.purge_schedule, clock.as_ref()).await?;

    let mut scheduler = Scheduler::new();
    scheduler.spawn_task(
        settings.tick_interval,
        "maintenance_tick",
        components.service,
        |service, cancel| async move {
            service
                .process_due_tasks(&cancel)
                .await
                .map_err(anyhow::Error::from)
        },
    );

    tracing::info!(
        tick_interval_secs = settings.tick_interval.as_secs(),
        "Maintenance dispatcher running"
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutting down maintenance dispatcher");
    scheduler.shutdown(settings.shutdown_timeout).await;

    Ok(())
}
