use thiserror::Error;

use crate::domain::ScheduleError;

#[derive(Debug, Error)]
pub enum MaintenanceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("invalid schedule `{schedule}`: {source}")]
    InvalidSchedule {
        schedule: String,
        #[source]
        source: ScheduleError,
    },
    #[error("maintenance task repository error: {0:#}")]
    Repository(#[source] anyhow::Error),
    #[error("backup repository error: {0:#}")]
    BackupRepository(#[source] anyhow::Error),
    #[error("publish error: {0:#}")]
    Publish(#[source] anyhow::Error),
    #[error("operation cancelled")]
    Cancelled,
}
