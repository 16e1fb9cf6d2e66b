//! Minimum-interval gate for outbound requests.
//!
//! The limiter remembers the time of the most recent *attempt*. A new attempt
//! is allowed when none has been made yet or when at least the configured
//! interval has elapsed since the last one. Attempts are recorded whether or
//! not the subsequent send succeeds.
use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use parking_lot::Mutex;

/// Clock returning milliseconds since an arbitrary fixed origin.
pub type TimeProvider = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Gates send attempts to at most one per interval.
pub struct RateLimiter {
    interval_ms: Option<u64>,
    last_attempt: Mutex<Option<u64>>,
    time_provider: TimeProvider,
}

impl RateLimiter {
    /// Create a limiter. `None` or a zero interval disables throttling.
    pub fn new(interval: Option<Duration>, time_provider: TimeProvider) -> Self {
        let interval_ms = interval
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
            .filter(|ms| *ms > 0);
        Self {
            interval_ms,
            last_attempt: Mutex::new(None),
            time_provider,
        }
    }

    /// Return whether an attempt at `now_ms` would be permitted.
    pub fn allow(&self, now_ms: u64) -> bool {
        permits(self.interval_ms, *self.last_attempt.lock(), now_ms)
    }

    /// Record an attempt made at `now_ms`.
    pub fn record_attempt(&self, now_ms: u64) {
        *self.last_attempt.lock() = Some(now_ms);
    }

    /// Check and record an attempt against the limiter's clock.
    ///
    /// The check and the update happen under one lock, so concurrent callers
    /// sharing a limiter cannot both pass inside the same interval.
    pub fn try_acquire(&self) -> bool {
        let now = (self.time_provider)();
        let mut last = self.last_attempt.lock();
        if !permits(self.interval_ms, *last, now) {
            return false;
        }
        *last = Some(now);
        true
    }
}

fn permits(interval_ms: Option<u64>, last: Option<u64>, now: u64) -> bool {
    match (interval_ms, last) {
        (None, _) | (_, None) => true,
        (Some(interval), Some(last)) => now.saturating_sub(last) >= interval,
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("interval_ms", &self.interval_ms)
            .field("last_attempt", &*self.last_attempt.lock())
            .finish()
    }
}

/// Returns the current time in milliseconds since the UNIX epoch.
///
/// Returns 0 if the system clock is before the UNIX epoch.
pub fn system_time_provider() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
