use chrono::{DateTime, Utc};
use std::time::Duration;

/// Interval at which date nodes are re-derived by [`super::Engine::run_clock`].
pub const DATE_TICK: Duration = Duration::from_secs(1);

/// Source of the current time for compute rules.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
