use chrono::{DateTime, Duration, Utc};

/// Time source for the lifecycle service. Production uses [`SystemClock`];
/// tests substitute a manual clock to simulate suspensions and relaunches.
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

/// The instant the attempt runs out: anchor + fixed duration. Both inputs
/// are immutable once the attempt exists, so the deadline never moves on
/// re-entry, backgrounding, or relaunch.
pub fn deadline(started_at: DateTime<Utc>, duration_minutes: i32) -> DateTime<Utc> {
    started_at + Duration::minutes(duration_minutes as i64)
}

/// Remaining whole seconds, floored at zero. Always recomputed from the
/// anchor, never from an in-memory countdown.
pub fn remaining_seconds(
    started_at: DateTime<Utc>,
    duration_minutes: i32,
    now: DateTime<Utc>,
) -> i64 {
    (deadline(started_at, duration_minutes) - now)
        .num_seconds()
        .max(0)
}

pub fn is_expired(started_at: DateTime<Utc>, duration_minutes: i32, now: DateTime<Utc>) -> bool {
    remaining_seconds(started_at, duration_minutes, now) == 0
}
