//! Spacing between network requests
//!
//! The portal is rate sensitive, so consecutive network requests are kept at
//! least `request-delay-ms` apart. Responses served from the cache never
//! start a new interval.

use std::time::{Duration, Instant};

/// Tracks the last network request and enforces the minimum delay
#[derive(Debug, Clone)]
pub struct Pacer {
    min_delay: Duration,
    last_request_time: Option<Instant>,
}

impl Pacer {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request_time: None,
        }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Records that a request went out over the network
    pub fn record_request(&mut self) {
        self.record_request_at(Instant::now());
    }

    fn record_request_at(&mut self, now: Instant) {
        self.last_request_time = Some(now);
    }

    /// Time left before the next network request may be sent
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.duration_since(last);
        if elapsed < self.min_delay {
            Some(self.min_delay - elapsed)
        } else {
            None
        }
    }

    /// Sleeps until the next network request is allowed
    pub async fn wait(&self) {
        if let Some(wait) = self.time_until_next_request(Instant::now()) {
            tracing::trace!("Pacing: waiting {:?} before next request", wait);
            tokio::time::sleep(wait).await;
        }
    }
}
