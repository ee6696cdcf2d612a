//! Token bucket rate limiter for allocation providers.
//!
//! Each provider instance owns one bucket with a configurable capacity and
//! refill rate. Callers wait asynchronously until a token is available.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

/// Default rate limit: 60 requests per minute.
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 60;

/// Default bucket capacity (allows bursting).
const DEFAULT_BUCKET_CAPACITY: f64 = 10.0;

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    /// Tokens per second
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn new(requests_per_minute: u32, capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(requests_per_minute.max(1)) / 60.0,
            capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn time_until_available(&mut self) -> Duration {
        self.refill();
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// Rate limiter configuration.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub burst_capacity: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            burst_capacity: DEFAULT_BUCKET_CAPACITY,
        }
    }
}

/// Thread-safe single-bucket rate limiter.
pub struct RateLimiter {
    name: &'static str,
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    pub fn new(name: &'static str, config: RateLimitConfig) -> Self {
        Self {
            name,
            bucket: Mutex::new(TokenBucket::new(
                config.requests_per_minute,
                config.burst_capacity.max(1.0),
            )),
        }
    }

    /// Lock the bucket, recovering from poison if necessary.
    fn lock_bucket(&self) -> MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter '{}' mutex was poisoned, recovering", self.name);
            poisoned.into_inner()
        })
    }

    /// Waits until a token is available, then takes it.
    pub async fn acquire(&self) {
        loop {
            let wait_time = {
                let mut bucket = self.lock_bucket();
                if bucket.try_acquire() {
                    return;
                }
                bucket.time_until_available()
            };

            if wait_time > Duration::ZERO {
                debug!("Rate limiter: waiting {:?} for '{}'", wait_time, self.name);
                tokio::time::sleep(wait_time).await;
            }
        }
    }

    /// Takes a token without waiting. Returns false when rate limited.
    pub fn try_acquire(&self) -> bool {
        self.lock_bucket().try_acquire()
    }

    pub fn remaining_tokens(&self) -> f64 {
        let mut bucket = self.lock_bucket();
        bucket.refill();
        bucket.tokens
    }
}
