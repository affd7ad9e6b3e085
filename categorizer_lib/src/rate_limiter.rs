//! Shared cooldown gate and retry logic for registry requests.
//!
//! Every `every` completed registry calls arm a cooldown that all workers
//! honor before their next call. A `RateLimited` response is retried with
//! exponential backoff plus jitter.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::registry::RegistryError;

/// Process-wide cooldown gate.
///
/// The call counter is atomic; the cooldown deadline sits behind a tokio
/// Mutex that is never held across a sleep.
pub struct CooldownLimiter {
    calls: AtomicU64,
    every: u64,
    cooldown: Duration,
    resume_at: Mutex<Option<Instant>>,
    tracker: RequestTracker,
}

impl CooldownLimiter {
    /// A limiter that pauses for `cooldown` after every `every` calls.
    /// `every == 0` disables the cooldown.
    pub fn new(every: u64, cooldown: Duration) -> Self {
        Self {
            calls: AtomicU64::new(0),
            every,
            cooldown,
            resume_at: Mutex::new(None),
            tracker: RequestTracker::new(),
        }
    }

    /// Wait out any active cooldown.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let resume_at = self.resume_at.lock().await;
                match *resume_at {
                    Some(at) if at > Instant::now() => at.duration_since(Instant::now()),
                    _ => return,
                }
            };
            sleep(wait).await;
        }
    }

    /// Count one completed registry call, arming the cooldown on every
    /// `every`-th call.
    pub async fn record_call(&self) {
        let n = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        if self.every > 0 && n % self.every == 0 && !self.cooldown.is_zero() {
            let mut resume_at = self.resume_at.lock().await;
            *resume_at = Some(Instant::now() + self.cooldown);
            tracing::debug!(
                "Cooldown for {}ms after {} registry calls",
                self.cooldown.as_millis(),
                n
            );
        }
    }

    /// Completed registry calls so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Access the request tracker for recording outcomes.
    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }
}

/// Atomic counters tracking registry request outcomes.
#[derive(Default)]
pub struct RequestTracker {
    requests_made: AtomicU64,
    requests_succeeded: AtomicU64,
    requests_rate_limited: AtomicU64,
    requests_failed: AtomicU64,
    /// Cumulative backoff time in milliseconds.
    total_backoff_ms: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        self.requests_made.fetch_add(1, Ordering::Relaxed);
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rate_limited(&self) {
        self.requests_made.fetch_add(1, Ordering::Relaxed);
        self.requests_rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_made.fetch_add(1, Ordering::Relaxed);
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backoff(&self, duration: Duration) {
        self.total_backoff_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Snapshot the current counters.
    pub fn summary(&self) -> TrackerSummary {
        TrackerSummary {
            requests_made: self.requests_made.load(Ordering::Relaxed),
            requests_succeeded: self.requests_succeeded.load(Ordering::Relaxed),
            requests_rate_limited: self.requests_rate_limited.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            total_backoff_secs: self.total_backoff_ms.load(Ordering::Relaxed) as f64 / 1000.0,
        }
    }
}

/// Immutable snapshot of tracker counters for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackerSummary {
    pub requests_made: u64,
    pub requests_succeeded: u64,
    pub requests_rate_limited: u64,
    pub requests_failed: u64,
    pub total_backoff_secs: f64,
}

/// Run a registry call behind the cooldown gate, retrying `RateLimited`.
///
/// - Waits on `limiter.acquire()` before each attempt and counts the attempt
///   afterwards.
/// - On `RegistryError::RateLimited`: waits `base_backoff * 2^attempt` plus up
///   to half of `base_backoff` of jitter, then retries up to `max_retries`
///   times.
/// - Any other error returns immediately.
pub async fn with_retry<F, Fut, T>(
    limiter: &CooldownLimiter,
    max_retries: u32,
    base_backoff: Duration,
    operation: F,
) -> Result<T, RegistryError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RegistryError>>,
{
    let tracker = limiter.tracker();
    let mut attempt = 0u32;

    loop {
        limiter.acquire().await;
        let outcome = operation().await;
        limiter.record_call().await;

        match outcome {
            Ok(val) => {
                tracker.record_success();
                return Ok(val);
            }
            Err(RegistryError::RateLimited) => {
                tracker.record_rate_limited();
                if attempt >= max_retries {
                    return Err(RegistryError::RateLimited);
                }

                let backoff = base_backoff.saturating_mul(1u32 << attempt.min(16));
                let jitter_cap = (base_backoff.as_millis() as u64) / 2;
                let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_cap));
                let total_wait = backoff + jitter;

                attempt += 1;
                tracing::warn!(
                    "Registry rate limited, retry {}/{} in {}ms",
                    attempt,
                    max_retries,
                    total_wait.as_millis()
                );
                tracker.record_backoff(total_wait);
                sleep(total_wait).await;
            }
            Err(e) => {
                tracker.record_failure();
                return Err(e);
            }
        }
    }
}
