//! Process-global rate limiting for outbound requests.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Enforces a minimum gap between outbound requests, across all users.
///
/// The lock is held through the sleep so concurrent callers queue up and the
/// upstream site sees at most one request per gap.
pub struct RateLimiter {
    min_gap: Duration,
    last_send: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last_send: Mutex::new(None),
        }
    }

    /// Waits until the minimum gap since the previous send has elapsed, then
    /// claims the current instant as the new send time.
    pub async fn acquire(&self) {
        if self.min_gap.is_zero() {
            return;
        }
        let mut last = self.last_send.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_gap {
                let wait = self.min_gap - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "rate limiter delaying request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_calls_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_secs(1));

        let start = Instant::now();
        limiter.acquire().await;
        let first = start.elapsed();
        limiter.acquire().await;
        let second = start.elapsed();

        // First call goes straight through; second waits out the gap
        assert!(first < Duration::from_millis(10));
        assert!(second >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gap_already_elapsed_means_no_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let before = Instant::now();
        limiter.acquire().await;
        assert!(before.elapsed() < Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_gap_is_a_noop() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let before = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(before.elapsed() < Duration::from_millis(1));
    }
}
