//! Clock shared by the server. With `mock-time`, tests can pin and move it.

use jiff::{Span, Timestamp};
#[cfg(feature = "mock-time")]
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct TimeSource {
    #[cfg(feature = "mock-time")]
    time: Arc<Mutex<Timestamp>>,
}

impl TimeSource {
    #[allow(clippy::new_without_default)]
    #[cfg(not(feature = "mock-time"))]
    pub fn new() -> Self {
        Self {}
    }

    #[cfg(feature = "mock-time")]
    pub fn new(initial_time: Timestamp) -> Self {
        Self {
            time: Arc::new(Mutex::new(initial_time)),
        }
    }

    #[cfg(not(feature = "mock-time"))]
    pub fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    #[cfg(feature = "mock-time")]
    pub fn now(&self) -> Timestamp {
        *self.lock()
    }

    /// The instant `span` from now, as whole seconds since the unix epoch.
    ///
    /// Used for expiring signed links; saturates instead of failing for
    /// spans that leave the supported range.
    pub fn unix_seconds_after(&self, span: Span) -> i64 {
        self.now()
            .checked_add(span)
            .unwrap_or(Timestamp::MAX)
            .as_second()
    }

    #[cfg(feature = "mock-time")]
    pub fn advance(&self, duration: Span) {
        let mut time = self.lock();
        *time = time.checked_add(duration).unwrap_or(Timestamp::MAX);
    }

    #[cfg(feature = "mock-time")]
    fn lock(&self) -> std::sync::MutexGuard<'_, Timestamp> {
        // the mutex only guards a Copy value, so a poisoned lock is still
        // holding a valid timestamp
        self.time.lock().unwrap_or_else(|e| e.into_inner())
    }
}
