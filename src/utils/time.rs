use chrono::{DateTime, Utc};

/// Clock seam so completion predicates stay deterministic under test. The
/// engine never calls `Utc::now()` directly; services hold a clock and pass
/// the instant down into the pure predicates.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
