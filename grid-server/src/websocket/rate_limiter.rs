use std::time::{Duration, Instant};

/// Per-connection token bucket. Word submissions are bursty, so the
/// bucket is sized for a short spike and refills at a steady rate.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: f64,
    capacity: f64,
    refill_per_second: f64,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(20, 4.0)
    }

    pub fn with_limits(capacity: u32, refill_per_second: f64) -> Self {
        Self {
            tokens: capacity as f64,
            capacity: capacity as f64,
            refill_per_second,
            last_refill: Instant::now(),
        }
    }

    pub fn allow(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        self.tokens =
            (self.tokens + elapsed.as_secs_f64() * self.refill_per_second).min(self.capacity);
        self.last_refill = now;
    }

    pub fn remaining(&mut self) -> u32 {
        self.refill();
        self.tokens as u32
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
