use std::sync::Arc;

use backup_maintenance::{
    app::{self, PURGE_TASK_NAME},
    domain::TaskKind,
    repository::{MaintenanceTaskRepository, MemoryMaintenanceTaskRepository},
};
use chrono::{TimeZone, Utc};

mod common;

use common::ManualClock;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 34, 0).unwrap(),
    ))
}

#[tokio::test]
async fn seeding_creates_purge_task() {
    let clock = clock();
    let repo = MemoryMaintenanceTaskRepository::new(clock.clone());

    app::seed_default_tasks(&repo, "@daily", clock.as_ref())
        .await
        .expect("seeding should succeed");

    let tasks = repo.find_all().await.unwrap();
    assert_eq!(tasks.len(), 1);

    let task = &tasks[0];
    assert_eq!(task.name(), PURGE_TASK_NAME);
    assert_eq!(task.kind(), &TaskKind::Purge);
    assert_eq!(task.schedule(), "@daily");
    assert!(task.enabled());
    assert_eq!(task.last_run_at(), None);
    assert_eq!(
        task.next_run_at(),
        Some(Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn seeding_twice_keeps_one_task() {
    let clock = clock();
    let repo = MemoryMaintenanceTaskRepository::new(clock.clone());

    app::seed_default_tasks(&repo, "@daily", clock.as_ref())
        .await
        .unwrap();
    let first = repo.find_all().await.unwrap();

    // a changed default does not overwrite what is stored
    app::seed_default_tasks(&repo, "0 3 * * *", clock.as_ref())
        .await
        .unwrap();
    let second = repo.find_all().await.unwrap();

    assert_eq!(second.len(), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn seeding_rejects_bad_schedule() {
    let clock = clock();
    let repo = MemoryMaintenanceTaskRepository::new(clock.clone());

    let result = app::seed_default_tasks(&repo, "every night", clock.as_ref()).await;

    assert!(result.is_err());
    assert!(repo.find_all().await.unwrap().is_empty());
}
