//! Time source and simulated latency
//!
//! The mock data source stamps dates and waits out its simulated network
//! delays through a [`Clock`], so tests can swap in a [`ManualClock`] that
//! never sleeps on the wall clock but still yields at every delay.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Mutex;
use std::time::Duration;

/// Simulated latencies of the mock data source
pub mod latency {
    use std::time::Duration;

    pub const FOLLOW: Duration = Duration::from_millis(300);
    pub const ADD_KNOWLEDGE_BASE: Duration = Duration::from_millis(300);
    pub const ADD_PAPER: Duration = Duration::from_millis(300);
    pub const SEARCH_PAPERS: Duration = Duration::from_millis(800);
    pub const CREATE_WITH_PAPERS: Duration = Duration::from_millis(1000);
}

#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date of `now()`, no time component
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by tokio timers
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    delays: bool,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { delays: true }
    }

    /// Real time, but simulated latency collapses to a yield
    pub fn without_delays() -> Self {
        Self { delays: false }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        if self.delays {
            tokio::time::sleep(duration).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}

/// Clock that only moves when told to (or when slept on)
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    slept: Mutex<Duration>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            slept: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let by = chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = to;
    }

    /// Total simulated delay observed so far
    pub fn total_slept(&self) -> Duration {
        *self.slept.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        *self.slept.lock().unwrap_or_else(|e| e.into_inner()) += duration;
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_manual_clock_sleep_advances_without_waiting() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 23, 59, 59).unwrap()
            + chrono::Duration::milliseconds(500);
        let clock = ManualClock::new(start);

        let wall = std::time::Instant::now();
        clock.sleep(latency::SEARCH_PAPERS).await;
        assert!(wall.elapsed() < Duration::from_millis(500));

        assert_eq!(clock.total_slept(), latency::SEARCH_PAPERS);
        assert_eq!(clock.now(), start + chrono::Duration::milliseconds(800));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
    }
}
