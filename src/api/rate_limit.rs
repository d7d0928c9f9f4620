//! Rate limiting for the magic link request endpoint.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

pub trait RateLimiter: Send + Sync {
    fn check_ip(&self, ip: Option<&str>) -> RateLimitDecision;
}

#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check_ip(&self, _ip: Option<&str>) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }
}

/// In-memory fixed-window limiter keyed by client IP. Requests without a
/// resolvable IP share one bucket so they cannot bypass the limit.
pub struct FixedWindowRateLimiter {
    max_per_window: u32,
    window: Duration,
    buckets: Mutex<HashMap<String, (Instant, u32)>>,
}

impl FixedWindowRateLimiter {
    #[must_use]
    pub fn new(max_per_window: u32, window: Duration) -> Self {
        Self {
            max_per_window,
            window,
            buckets: Mutex::new(HashMap::new()),
        }
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check_ip(&self, ip: Option<&str>) -> RateLimitDecision {
        let key = ip.unwrap_or("unknown");
        let now = Instant::now();
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Drop windows that have fully elapsed so the map stays bounded.
        buckets.retain(|_, (started, _)| now.duration_since(*started) < self.window);

        let (started, count) = buckets
            .entry(key.to_string())
            .or_insert_with(|| (now, 0));
        if now.duration_since(*started) >= self.window {
            *started = now;
            *count = 0;
        }
        if *count >= self.max_per_window {
            return RateLimitDecision::Limited;
        }
        *count += 1;
        RateLimitDecision::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_rate_limiter_allows() {
        let limiter = NoopRateLimiter;
        assert_eq!(limiter.check_ip(None), RateLimitDecision::Allowed);
        assert_eq!(limiter.check_ip(Some("10.0.0.1")), RateLimitDecision::Allowed);
    }

    #[test]
    fn fixed_window_limits_after_max() {
        let limiter = FixedWindowRateLimiter::new(3, Duration::from_secs(3600));
        for _ in 0..3 {
            assert_eq!(limiter.check_ip(Some("10.0.0.1")), RateLimitDecision::Allowed);
        }
        assert_eq!(limiter.check_ip(Some("10.0.0.1")), RateLimitDecision::Limited);
    }

    #[test]
    fn buckets_are_per_ip() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_secs(3600));
        assert_eq!(limiter.check_ip(Some("10.0.0.1")), RateLimitDecision::Allowed);
        assert_eq!(limiter.check_ip(Some("10.0.0.2")), RateLimitDecision::Allowed);
        assert_eq!(limiter.check_ip(Some("10.0.0.1")), RateLimitDecision::Limited);
    }

    #[test]
    fn missing_ip_shares_one_bucket() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_secs(3600));
        assert_eq!(limiter.check_ip(None), RateLimitDecision::Allowed);
        assert_eq!(limiter.check_ip(None), RateLimitDecision::Limited);
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_millis(10));
        assert_eq!(limiter.check_ip(Some("10.0.0.1")), RateLimitDecision::Allowed);
        assert_eq!(limiter.check_ip(Some("10.0.0.1")), RateLimitDecision::Limited);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(limiter.check_ip(Some("10.0.0.1")), RateLimitDecision::Allowed);
    }
}
