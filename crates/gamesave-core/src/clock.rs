//! Wall-clock abstraction so the domain service never reads system time
//! directly -- tests inject a fixed clock instead.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of the current wall-clock time, in whole seconds since epoch.
pub trait Clock: Send + Sync {
    fn now_secs(&self) -> i64;
}

/// Reads the OS wall clock. Used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_secs(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the epoch")
            .as_secs() as i64
    }
}

/// A clock fixed to (and independently advanceable from) a starting value.
/// Used by tests that assert exact `created_at`/`updated_at` values.
#[derive(Debug)]
pub struct FixedClock {
    secs: AtomicI64,
}

impl FixedClock {
    #[must_use]
    pub fn new(secs: i64) -> Self {
        Self {
            secs: AtomicI64::new(secs),
        }
    }

    pub fn advance(&self, delta_secs: i64) {
        self.secs.fetch_add(delta_secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_secs(&self) -> i64 {
        self.secs.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_returns_positive_seconds() {
        assert!(SystemClock.now_secs() > 0);
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(100);
        assert_eq!(clock.now_secs(), 100);
        clock.advance(5);
        assert_eq!(clock.now_secs(), 105);
    }
}
