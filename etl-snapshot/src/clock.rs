use std::fmt::Debug;

/// Source of wall-clock time for the snapshot tracker, in milliseconds since the Unix epoch.
pub trait Clock: Debug + Send + Sync {
    fn current_time_millis(&self) -> i64;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_time_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_epoch() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.current_time_millis() > 1_577_836_800_000);
    }
}
