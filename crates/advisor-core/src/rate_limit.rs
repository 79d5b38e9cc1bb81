//! Fixed-window request limiter.
//!
//! Each key gets a counter and a reset instant. The first request after the
//! reset instant starts a fresh window; within a window at most
//! `max_requests` are allowed. State is process-local: two processes (or two
//! browser tabs) each enforce their own limit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::debug;

/// Stand-in end for windows too long for the platform clock (~100 years).
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Limit applied to every key of one [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self { max_requests, window }
    }
}

/// Outcome of [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Denied; the window reopens in `retry_after_secs` (always ≥ 1).
    Limited { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

#[derive(Debug, Clone, Copy)]
struct RateLimitRecord {
    count: u32,
    reset_at: Instant,
}

/// Per-key fixed-window counter map.
#[derive(Debug)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl RateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self { policy, records: Mutex::new(HashMap::new()) }
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Count one request for `key` and decide whether it may proceed.
    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// [`check`](Self::check) with an explicit clock.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut records = self.lock();

        if let Some(record) = records.get_mut(key) {
            if now <= record.reset_at {
                if record.count >= self.policy.max_requests {
                    let remaining = record.reset_at - now;
                    let secs = remaining.as_nanos().div_ceil(1_000_000_000);
                    return RateDecision::Limited {
                        retry_after_secs: u64::try_from(secs).unwrap_or(u64::MAX).max(1),
                    };
                }
                record.count += 1;
                return RateDecision::Allowed;
            }
        }

        records.insert(
            key.to_owned(),
            RateLimitRecord { count: 1, reset_at: self.window_end(now) },
        );
        RateDecision::Allowed
    }

    /// End of a window opened at `now`, saturating for windows the clock
    /// cannot represent.
    fn window_end(&self, now: Instant) -> Instant {
        now.checked_add(self.policy.window)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now)
    }

    /// Drop every record whose window has closed. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// [`sweep`](Self::sweep) with an explicit clock.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut records = self.lock();
        let before = records.len();
        records.retain(|_, r| now <= r.reset_at);
        before - records.len()
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sweep expired records every `every` until the returned task is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = limiter.sweep();
                if removed > 0 {
                    debug!(removed, remaining = limiter.len(), "swept expired rate-limit records");
                }
            }
        })
    }

    // A panic while holding the lock cannot leave a record half-written, so a
    // poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateLimitRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
