use chrono::{DateTime, Local, Utc};

/// Source of "now" for everything that stamps or expires messages.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Local time-of-day label shown next to a message
    fn label_for(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&Local).format("%H:%M").to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub use manual::ManualClock;
