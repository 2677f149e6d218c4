mod backup;
mod host;
mod schedule;
mod task;

pub use backup::{Backup, BackupId, BackupRow};
pub use host::{Host, HostId, HostRow};
pub use schedule::{CronSchedule, ScheduleError};
pub use task::{MaintenanceTask, MaintenanceTaskRow, TaskId, TaskKind};
