//! Deterministic clock abstraction for session expiry and card timestamps.

use chrono::{DateTime, Utc};
use std::sync::{Mutex, PoisonError};

/// Clock trait for deterministic time in tests.
pub trait Clock: Send + Sync {
    /// Get the current UTC time.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System clock using actual wall time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests and replays.
///
/// Shared behind an `Arc` by the session cache, so advancing goes through
/// `&self`.
#[derive(Debug)]
pub struct MockClock {
    now: Mutex<DateTime<Utc>>,
}

impl MockClock {
    /// Create a mock clock frozen at the given time.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Create a mock clock from an RFC 3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self::new(
            DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc),
        ))
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = *now + duration;
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn system_clock_returns_time() {
        let now = SystemClock.now_utc();
        assert!(now.year() >= 2024);
    }

    #[test]
    fn mock_clock_is_frozen() {
        let clock = MockClock::from_rfc3339("2023-08-05T09:30:00Z").unwrap();
        assert_eq!(clock.now_utc(), clock.now_utc());
        assert_eq!(clock.now_utc().to_rfc3339(), "2023-08-05T09:30:00+00:00");
    }

    #[test]
    fn mock_clock_advances_through_shared_reference() {
        let clock = std::sync::Arc::new(MockClock::from_rfc3339("2023-08-05T09:30:00Z").unwrap());
        let shared: std::sync::Arc<dyn Clock> = clock.clone();
        clock.advance(chrono::Duration::minutes(31));
        assert_eq!(shared.now_utc().to_rfc3339(), "2023-08-05T10:01:00+00:00");
    }

    #[test]
    fn mock_clock_rejects_bad_timestamp() {
        assert!(MockClock::from_rfc3339("yesterday").is_err());
    }
}
