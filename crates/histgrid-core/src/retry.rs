//! Retry and backoff policy for archive queries
//!
//! Delays start at `initial_backoff` (never below one millisecond), double after
//! every unsuccessful attempt and are clamped to `max_backoff`. Arithmetic
//! saturates, so the sequence never overflows and never decreases.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(300);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

const MIN_BACKOFF: Duration = Duration::from_millis(1);

/// How many attempts a fetch may make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryMode {
    /// Retry until success or a fatal error
    Forever,

    /// Make at most `max_attempts` attempts, then give up with an empty result
    Bounded { max_attempts: u32 },
}

/// What a successful but empty query means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyResultPolicy {
    /// Treat "no data" as transient and back off
    Retry,

    /// Accept "no data" as the answer
    Accept,
}

/// Immutable retry configuration shared by all fetches of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub mode: RetryMode,
    pub on_empty: EmptyResultPolicy,

    /// Give up once the next sleep would push total elapsed time past this
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RetryPolicy {
    /// Retry forever, treating empty results as transient
    pub fn unbounded() -> Self {
        Self {
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            mode: RetryMode::Forever,
            on_empty: EmptyResultPolicy::Retry,
            max_elapsed: None,
        }
    }

    /// At most `max_attempts` attempts, empty results accepted
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            mode: RetryMode::Bounded { max_attempts },
            on_empty: EmptyResultPolicy::Accept,
            ..Self::unbounded()
        }
    }

    pub fn with_initial_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = initial;
        self
    }

    pub fn with_max_backoff(mut self, cap: Duration) -> Self {
        self.max_backoff = cap;
        self
    }

    pub fn with_empty_policy(mut self, on_empty: EmptyResultPolicy) -> Self {
        self.on_empty = on_empty;
        self
    }

    pub fn with_max_elapsed(mut self, budget: Duration) -> Self {
        self.max_elapsed = Some(budget);
        self
    }

    /// Fresh delay sequence for one fetch
    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.initial_backoff, self.max_backoff)
    }

    /// Whether another attempt may follow `attempts_made` attempts
    ///
    /// `elapsed` is the time spent so far in this fetch and `next_delay` the
    /// sleep that would precede the next attempt.
    pub fn permits_retry(&self, attempts_made: u32, elapsed: Duration, next_delay: Duration) -> bool {
        if let RetryMode::Bounded { max_attempts } = self.mode {
            // Bounded(0) still makes the first attempt
            if attempts_made >= max_attempts.max(1) {
                return false;
            }
        }
        match self.max_elapsed {
            Some(budget) => elapsed.saturating_add(next_delay) <= budget,
            None => true,
        }
    }
}

/// Capped exponential delay sequence
///
/// ```rust
/// use histgrid_core::Backoff;
/// use std::time::Duration;
///
/// let delays: Vec<_> = Backoff::new(Duration::from_millis(300), Duration::from_secs(1))
///     .take(4)
///     .map(|d| d.as_millis())
///     .collect();
/// assert_eq!(delays, [300, 600, 1000, 1000]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    current: Duration,
    cap: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, cap: Duration) -> Self {
        let cap = cap.max(MIN_BACKOFF);
        Self {
            current: initial.max(MIN_BACKOFF).min(cap),
            cap,
        }
    }

    /// Delay that the next sleep will use
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Double the delay, clamped to the cap
    pub fn advance(&mut self) {
        self.current = self
            .current
            .checked_mul(2)
            .unwrap_or(self.cap)
            .min(self.cap);
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let delay = self.current;
        self.advance();
        Some(delay)
    }
}
