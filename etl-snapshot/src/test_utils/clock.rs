use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::clock::Clock;

/// A manually driven [`Clock`].
///
/// Clones share the same time, so a test can keep one clone and move time forward while the
/// tracker holds another.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    now_millis: Arc<AtomicI64>,
}

impl MockClock {
    pub fn new(now_millis: i64) -> Self {
        Self {
            now_millis: Arc::new(AtomicI64::new(now_millis)),
        }
    }

    pub fn set(&self, now_millis: i64) {
        self.now_millis.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance_millis(&self, millis: i64) {
        self.now_millis.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn current_time_millis(&self) -> i64 {
        self.now_millis.load(Ordering::SeqCst)
    }
}
