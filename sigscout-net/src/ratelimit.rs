//! Per-adapter request rate limiting
//!
//! Each adapter owns one limiter; limiters are never shared across
//! adapters. `wait_if_needed` is the system's only intentional blocking
//! point besides network I/O itself.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum-interval throttle: at least `60/requests_per_minute` seconds
/// between permitted requests.
pub struct RateLimiter {
    requests_per_minute: u32,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        let rpm = requests_per_minute.max(1);
        Self {
            requests_per_minute: rpm,
            min_interval: Duration::from_secs_f64(60.0 / rpm as f64),
            last_request: Mutex::new(None),
        }
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Sleep until the minimum interval since the last permitted request
    /// has elapsed, then record the new timestamp. FIFO by arrival.
    pub async fn wait_if_needed(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_passes_immediately() {
        let limiter = RateLimiter::new(6);
        let start = Instant::now();
        limiter.wait_if_needed().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_second_request_waits_min_interval() {
        // 600 rpm -> 100ms interval keeps the test fast
        let limiter = RateLimiter::new(600);
        let start = Instant::now();
        limiter.wait_if_needed().await;
        limiter.wait_if_needed().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_zero_rpm_clamped() {
        let limiter = RateLimiter::new(0);
        assert_eq!(limiter.requests_per_minute(), 1);
    }
}
