use std::time::{Duration, Instant};

/// Single-slot leaky bucket that spaces out navigations
///
/// The limiter remembers when the last navigation started. Before the next one
/// it sleeps for whatever is left of the configured interval. A zero interval
/// disables throttling.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Minimum time between two navigations
    interval: Duration,

    /// Timestamp of the last navigation
    last_request_time: Option<Instant>,
}

impl RateLimiter {
    /// Creates a limiter with the given interval in milliseconds
    pub fn from_millis(interval_ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(interval_ms),
            last_request_time: None,
        }
    }

    /// Returns the configured interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Calculates the time until the next navigation may start
    ///
    /// Returns None if a navigation can start now.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.interval {
            Some(self.interval - elapsed)
        } else {
            None
        }
    }

    /// Records that a navigation started at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.last_request_time = Some(now);
    }

    /// Sleeps for the remaining interval, then records the navigation
    pub async fn wait(&mut self) {
        if let Some(remaining) = self.time_until_next_request(Instant::now()) {
            tracing::trace!("Rate limit: sleeping {:?}", remaining);
            tokio::time::sleep(remaining).await;
        }
        self.record_request(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_millis(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_not_delayed() {
        let limiter = RateLimiter::from_millis(1000);
        assert!(limiter.time_until_next_request(Instant::now()).is_none());
    }

    #[test]
    fn test_remaining_interval() {
        let mut limiter = RateLimiter::from_millis(1000);
        let now = Instant::now();
        limiter.record_request(now);

        let remaining = limiter
            .time_until_next_request(now + Duration::from_millis(400))
            .unwrap();
        assert_eq!(remaining, Duration::from_millis(600));
    }

    #[test]
    fn test_no_delay_after_interval() {
        let mut limiter = RateLimiter::from_millis(1000);
        let now = Instant::now();
        limiter.record_request(now);

        assert!(limiter
            .time_until_next_request(now + Duration::from_millis(1500))
            .is_none());
    }

    #[test]
    fn test_zero_interval_unthrottled() {
        let mut limiter = RateLimiter::default();
        let now = Instant::now();
        limiter.record_request(now);
        assert!(limiter.time_until_next_request(now).is_none());
    }

    #[tokio::test]
    async fn test_wait_spaces_requests() {
        let mut limiter = RateLimiter::from_millis(50);
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
