//! Time sources for data point timestamps
//!
//! Data points are stamped with unix seconds. The clock is abstracted so
//! tests can pin timestamps.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::constants::time::MS_PER_SECOND;

/// Unix time in seconds
pub type UnixSeconds = i64;

/// Source of wall-clock time
pub trait TimeSource: Send + Sync {
    /// Milliseconds since the unix epoch
    fn now_millis(&self) -> i64;

    /// Seconds since the unix epoch, rounded to the nearest second
    fn now_seconds(&self) -> UnixSeconds {
        let ms = self.now_millis();
        let per_second = MS_PER_SECOND as i64;
        (ms + per_second / 2).div_euclid(per_second)
    }
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for testing
#[derive(Debug, Default)]
pub struct MockClock {
    millis: AtomicI64,
}

impl MockClock {
    /// Start at `seconds` past the epoch
    pub fn at_seconds(seconds: UnixSeconds) -> Self {
        Self {
            millis: AtomicI64::new(seconds * MS_PER_SECOND as i64),
        }
    }

    /// Jump to an absolute time in milliseconds
    pub fn set_millis(&self, millis: i64) {
        self.millis.store(millis, Ordering::Relaxed);
    }

    /// Move forward by `ms`
    pub fn advance(&self, ms: i64) {
        self.millis.fetch_add(ms, Ordering::Relaxed);
    }
}

impl TimeSource for MockClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::Relaxed)
    }
}
