use chrono::{DateTime, SubsecRound, Utc};

/// Source of "now" for scheduling decisions
///
/// Everything that compares against the wall clock goes through this trait so
/// tests can pin time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Host wall clock, truncated to the microsecond precision Postgres stores
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }
}
