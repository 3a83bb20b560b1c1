//! Token bucket implementation.

use parking_lot::Mutex;
use std::time::Instant;

use crate::config::LimiterSettings;

/// A token bucket refilled continuously at a fixed rate.
///
/// Refill is computed lazily at acquisition time from the elapsed wall
/// clock, so no background timer runs per bucket. One instance is shared
/// by all concurrent requests for its route key; the internal mutex is
/// the unit of mutual exclusion.
pub struct TokenBucket {
    /// Tokens added per second
    rate: f64,
    /// Maximum tokens the bucket can hold
    burst: f64,
    state: Mutex<BucketState>,
}

struct BucketState {
    /// Current token count, clamped to `[0, burst]`
    tokens: f64,
    /// Instant of the last refill computation
    refilled_at: Instant,
}

impl TokenBucket {
    /// Create a bucket seeded with a full burst of tokens.
    ///
    /// Settings are used as-is; callers pass sanitized values. A zero
    /// burst size yields a bucket that never admits.
    pub fn new(settings: &LimiterSettings) -> Self {
        let burst = f64::from(settings.burst_size);
        Self {
            rate: settings.requests_per_second,
            burst,
            state: Mutex::new(BucketState {
                tokens: burst,
                refilled_at: Instant::now(),
            }),
        }
    }

    /// Try to take one token, refilling from elapsed time first.
    ///
    /// Returns `true` if the request is admitted. A denied request
    /// consumes nothing, but the refill timestamp still advances so
    /// partial elapsed time is not lost across repeated denials.
    pub fn try_acquire(&self) -> bool {
        self.acquire_at(Instant::now())
    }

    pub(crate) fn acquire_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock();
        Self::refill(&mut state, self.rate, self.burst, now);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Current token count, refilled to `now`.
    pub fn available(&self) -> f64 {
        let mut state = self.state.lock();
        Self::refill(&mut state, self.rate, self.burst, Instant::now());
        state.tokens
    }

    /// Sustained admission rate in tokens per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Maximum instantaneous allowance.
    pub fn burst(&self) -> f64 {
        self.burst
    }

    fn refill(state: &mut BucketState, rate: f64, burst: f64, now: Instant) {
        // The timestamp only moves forward; concurrent callers may reach
        // the lock out of `now` order.
        if now > state.refilled_at {
            let elapsed = now - state.refilled_at;
            state.tokens = (state.tokens + elapsed.as_secs_f64() * rate).min(burst);
            state.refilled_at = now;
        }
    }
}
