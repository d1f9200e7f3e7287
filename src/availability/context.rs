use crate::domain::{Application, Authentication, CheckTime, Endpoint};
use chrono::{DateTime, Utc};

/// Source of "now" for recency decisions and check timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Everything one availability check learns about its source.
///
/// Each field is filled at most once while the run progresses; later stages read it
/// instead of fetching again.
#[derive(Clone, Debug)]
pub struct CheckContext {
    source_id: String,
    identity_headers: Vec<(String, String)>,
    pub endpoint: Option<Endpoint>,
    pub application: Option<Application>,
    pub authentication: Option<Authentication>,
    check_time: Option<CheckTime>,
}

impl CheckContext {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            identity_headers: Vec::new(),
            endpoint: None,
            application: None,
            authentication: None,
            check_time: None,
        }
    }

    pub fn with_identity_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.identity_headers = headers;
        self
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn identity_headers(&self) -> &[(String, String)] {
        &self.identity_headers
    }

    /// Records the run's check time on first call; later calls return the same value.
    pub fn record_check_time(&mut self, clock: &dyn Clock) -> CheckTime {
        *self
            .check_time
            .get_or_insert_with(|| CheckTime::at(clock.now()))
    }

    pub fn check_time(&self) -> Option<CheckTime> {
        self.check_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct TickingClock {
        seconds: AtomicI64,
    }

    impl Clock for TickingClock {
        fn now(&self) -> DateTime<Utc> {
            let secs = self.seconds.fetch_add(60, Ordering::SeqCst);
            DateTime::from_timestamp(1_700_000_000 + secs, 0).expect("valid timestamp")
        }
    }

    #[test]
    fn check_time_is_captured_once() {
        let clock = TickingClock {
            seconds: AtomicI64::new(0),
        };
        let mut context = CheckContext::new("42");

        let first = context.record_check_time(&clock);
        let second = context.record_check_time(&clock);

        assert_eq!(first, second);
        assert_eq!(context.check_time(), Some(first));
    }
}
