//! Process-wide rate limiting and bounded retry for external lookups.
//!
//! [`RateLimiter`] enforces a minimum interval between requests plus a cap on
//! requests per window (an hour by default). Callers block until their turn;
//! nothing is dropped. [`RateLimitedLookup`] wraps any [`CanonicalLookup`]
//! so that every attempt, retries included, goes through a shared limiter.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use super::lookup::{Candidate, CanonicalLookup, LookupError};
use super::platform::PlatformHint;

/// Default minimum interval between requests.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(1500);
/// Default request ceiling per hour.
pub const DEFAULT_HOURLY_CAP: u32 = 500;

const HOUR: Duration = Duration::from_secs(3600);

#[derive(Debug)]
struct LimiterState {
    last_request: Option<Instant>,
    window_start: Instant,
    requests_in_window: u32,
}

/// Blocking rate limiter shared by all workers.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    cap: u32,
    window: Duration,
    state: Mutex<LimiterState>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL, DEFAULT_HOURLY_CAP)
    }
}

impl RateLimiter {
    /// Create a limiter with an hourly cap.
    #[must_use]
    pub fn new(min_interval: Duration, hourly_cap: u32) -> Self {
        Self::with_window(min_interval, hourly_cap, HOUR)
    }

    /// Create a limiter with a custom cap window.
    ///
    /// A cap of zero is treated as one request per window.
    #[must_use]
    pub fn with_window(min_interval: Duration, cap: u32, window: Duration) -> Self {
        Self {
            min_interval,
            cap: cap.max(1),
            window,
            state: Mutex::new(LimiterState {
                last_request: None,
                window_start: Instant::now(),
                requests_in_window: 0,
            }),
        }
    }

    /// Block until a request is permitted, then record it.
    ///
    /// The lock is held while waiting, so concurrent callers are served one
    /// at a time in lock order.
    pub fn acquire(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let now = Instant::now();
        if now.duration_since(state.window_start) >= self.window {
            state.window_start = now;
            state.requests_in_window = 0;
        }

        if state.requests_in_window >= self.cap {
            let wait = self
                .window
                .saturating_sub(now.duration_since(state.window_start));
            log::warn!(
                "Lookup request cap of {} reached, waiting {:.0}s",
                self.cap,
                wait.as_secs_f64()
            );
            thread::sleep(wait);
            state.window_start = Instant::now();
            state.requests_in_window = 0;
        }

        if let Some(last) = state.last_request {
            let since = last.elapsed();
            if since < self.min_interval {
                thread::sleep(self.min_interval - since);
            }
        }

        state.last_request = Some(Instant::now());
        state.requests_in_window += 1;
    }

    /// Requests recorded in the current window.
    #[must_use]
    pub fn requests_in_window(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .requests_in_window
    }
}

/// Bounded retry with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Backoff step; attempt `n` waits `n * backoff` before retrying.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Wait before retrying after failed attempt `attempt`, saturating at
    /// [`Duration::MAX`].
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff.checked_mul(attempt).unwrap_or(Duration::MAX)
    }
}

/// A lookup whose every attempt is rate limited and retried on transient
/// failures.
pub struct RateLimitedLookup<L> {
    inner: L,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl<L: CanonicalLookup> RateLimitedLookup<L> {
    /// Wrap a lookup with a shared limiter and retry policy.
    pub fn new(inner: L, limiter: Arc<RateLimiter>, retry: RetryPolicy) -> Self {
        Self {
            inner,
            limiter,
            retry,
        }
    }

    /// The wrapped lookup.
    pub fn inner(&self) -> &L {
        &self.inner
    }
}

impl<L: CanonicalLookup> CanonicalLookup for RateLimitedLookup<L> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn lookup(
        &self,
        title: &str,
        platform: Option<&PlatformHint>,
    ) -> Result<Vec<Candidate>, LookupError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            self.limiter.acquire();
            match self.inner.lookup(title, platform) {
                Ok(candidates) => return Ok(candidates),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    log::debug!(
                        "{} lookup for {:?} failed (attempt {}/{}): {}",
                        self.inner.name(),
                        title,
                        attempt,
                        attempts,
                        e
                    );
                    thread::sleep(self.retry.backoff_for(attempt));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
