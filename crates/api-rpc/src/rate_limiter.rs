//! Rate Limiter (Token Bucket Algorithm)
//!
//! Caps the request rate of the whole server. One bucket, refilled
//! continuously; each request takes one token.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Token bucket shared by all RPC methods
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    max_tokens: f64,
    refill_per_sec: f64,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// `max_burst` tokens at most, `rate_per_sec` tokens added per second.
    ///
    /// `RateLimiter::new(200, 100)` allows 100 req/s with bursts of 200.
    pub fn new(max_burst: u32, rate_per_sec: u32) -> Self {
        Self {
            bucket: Mutex::new(Bucket {
                tokens: max_burst as f64,
                last_refill: Instant::now(),
            }),
            max_tokens: max_burst as f64,
            refill_per_sec: rate_per_sec as f64,
        }
    }

    /// Take one token. Returns false when the caller is being throttled.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    fn try_acquire_at(&self, now: Instant) -> bool {
        // A poisoned lock only means another request panicked mid-update
        let mut bucket = self
            .bucket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * self.refill_per_sec)
            .min(self.max_tokens);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until the next token is available (zero if one is ready)
    pub fn retry_after(&self) -> Duration {
        let bucket = self
            .bucket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if bucket.tokens >= 1.0 || self.refill_per_sec <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64((1.0 - bucket.tokens) / self.refill_per_sec)
    }
}
