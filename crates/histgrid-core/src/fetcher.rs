//! Retrying archive fetches
//!
//! [`RetryingFetcher`] wraps a single [`ArchiveSource`] query with the run's
//! [`RetryPolicy`]. Recoverable failures (and, by default, empty results) are
//! absorbed with capped exponential backoff; a fatal failure stops immediately.
//!
//! ## Error Classification
//!
//! | Outcome | Action |
//! |---------|--------|
//! | Non-empty samples | Return |
//! | Empty samples, `on_empty = Accept` | Return empty |
//! | Empty samples, `on_empty = Retry` | Back off, retry |
//! | `SourceError::Recoverable` | Back off, retry |
//! | `SourceError::Fatal` | Return `FetchError::Fatal` |
//! | Attempt or time budget exhausted | Return empty ("giving up") |

use crate::errors::{FetchError, SourceError};
use crate::retry::{EmptyResultPolicy, RetryPolicy};
use crate::types::{Sample, TimeWindow};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Archive query abstraction
///
/// Implementations translate their client's failures into [`SourceError`]:
/// `Recoverable` for anything a later attempt could fix, `Fatal` when the client
/// itself is unusable.
pub trait ArchiveSource: Send + Sync {
    /// Fetch all archived samples for `tag_id` inside `window` (inclusive)
    fn query(&self, tag_id: &str, window: &TimeWindow) -> Result<Vec<Sample>, SourceError>;

    /// Short name used in log fields
    fn name(&self) -> &str {
        "archive"
    }
}

impl<T: ArchiveSource + ?Sized> ArchiveSource for &T {
    fn query(&self, tag_id: &str, window: &TimeWindow) -> Result<Vec<Sample>, SourceError> {
        (**self).query(tag_id, window)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: ArchiveSource + ?Sized> ArchiveSource for Arc<T> {
    fn query(&self, tag_id: &str, window: &TimeWindow) -> Result<Vec<Sample>, SourceError> {
        (**self).query(tag_id, window)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: ArchiveSource + ?Sized> ArchiveSource for Box<T> {
    fn query(&self, tag_id: &str, window: &TimeWindow) -> Result<Vec<Sample>, SourceError> {
        (**self).query(tag_id, window)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Blocking delay between attempts
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<F> Sleeper for F
where
    F: Fn(Duration) + Send + Sync,
{
    fn sleep(&self, duration: Duration) {
        self(duration)
    }
}

/// Fetch counters, shared across worker threads
#[derive(Debug, Default)]
pub struct FetchMetrics {
    pub attempts: AtomicU64,
    pub retries: AtomicU64,
    pub empty_results: AtomicU64,
    pub recoverable_failures: AtomicU64,
    pub fatal_failures: AtomicU64,
    pub give_ups: AtomicU64,
}

impl FetchMetrics {
    pub fn snapshot(&self) -> FetchMetricsSnapshot {
        FetchMetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            empty_results: self.empty_results.load(Ordering::Relaxed),
            recoverable_failures: self.recoverable_failures.load(Ordering::Relaxed),
            fatal_failures: self.fatal_failures.load(Ordering::Relaxed),
            give_ups: self.give_ups.load(Ordering::Relaxed),
        }
    }
}

/// Immutable metrics snapshot for reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchMetricsSnapshot {
    pub attempts: u64,
    pub retries: u64,
    pub empty_results: u64,
    pub recoverable_failures: u64,
    pub fatal_failures: u64,
    pub give_ups: u64,
}

/// Archive source wrapped with retry, backoff and failure classification
pub struct RetryingFetcher<S> {
    source: S,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    metrics: Arc<FetchMetrics>,
}

impl<S: ArchiveSource> RetryingFetcher<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self {
            source,
            policy,
            sleeper: Arc::new(ThreadSleeper),
            metrics: Arc::new(FetchMetrics::default()),
        }
    }

    /// Replace the sleeper (tests record the schedule instead of waiting)
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn metrics(&self) -> &Arc<FetchMetrics> {
        &self.metrics
    }

    /// Query `tag_id` over `window`, retrying per policy
    ///
    /// Returns an empty vector when the policy accepts empty results or when a
    /// bounded budget is exhausted; the caller leaves that column missing.
    pub fn fetch(&self, tag_id: &str, window: &TimeWindow) -> Result<Vec<Sample>, FetchError> {
        let started = Instant::now();
        let mut slept = Duration::ZERO;
        let mut backoff = self.policy.backoff();
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            self.metrics.attempts.fetch_add(1, Ordering::Relaxed);

            match self.source.query(tag_id, window) {
                Ok(samples) if !samples.is_empty() => {
                    debug!(
                        event_type = "fetch_success",
                        source = self.source.name(),
                        tag = %tag_id,
                        attempt = attempts,
                        points = samples.len(),
                        "Fetched samples"
                    );
                    return Ok(samples);
                }
                Ok(samples) => {
                    self.metrics.empty_results.fetch_add(1, Ordering::Relaxed);
                    if self.policy.on_empty == EmptyResultPolicy::Accept {
                        return Ok(samples);
                    }
                    warn!(
                        event_type = "fetch_empty",
                        source = self.source.name(),
                        tag = %tag_id,
                        window = %window,
                        attempt = attempts,
                        "Archive returned no data"
                    );
                }
                Err(SourceError::Fatal(message)) => {
                    self.metrics.fatal_failures.fetch_add(1, Ordering::Relaxed);
                    error!(
                        event_type = "fetch_fatal",
                        source = self.source.name(),
                        tag = %tag_id,
                        window = %window,
                        error = %message,
                        "Archive client unusable, aborting"
                    );
                    return Err(FetchError::Fatal {
                        tag_id: tag_id.to_string(),
                        message,
                    });
                }
                Err(SourceError::Recoverable(message)) => {
                    self.metrics
                        .recoverable_failures
                        .fetch_add(1, Ordering::Relaxed);
                    warn!(
                        event_type = "fetch_failed",
                        source = self.source.name(),
                        tag = %tag_id,
                        window = %window,
                        attempt = attempts,
                        error = %message,
                        "Archive query failed"
                    );
                }
            }

            let delay = backoff.current();
            // Real time, or slept time when the sleeper does not actually block
            let elapsed = started.elapsed().max(slept);
            if !self.policy.permits_retry(attempts, elapsed, delay) {
                self.metrics.give_ups.fetch_add(1, Ordering::Relaxed);
                warn!(
                    event_type = "fetch_give_up",
                    source = self.source.name(),
                    tag = %tag_id,
                    window = %window,
                    attempts = attempts,
                    "Giving up, column stays missing for this window"
                );
                return Ok(Vec::new());
            }

            debug!(
                event_type = "fetch_backoff",
                tag = %tag_id,
                delay_ms = delay.as_millis() as u64,
                "Backing off before retry"
            );
            self.metrics.retries.fetch_add(1, Ordering::Relaxed);
            self.sleeper.sleep(delay);
            slept = slept.saturating_add(delay);
            backoff.advance();
        }
    }
}
