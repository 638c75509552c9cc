//! Retry policy configuration

use histgrid_core::{EmptyResultPolicy, RetryMode, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Serializable form of [`RetryPolicy`]
///
/// Without `max_attempts` fetches retry forever; `retry_on_empty` then defaults
/// to `true`. With `max_attempts` it defaults to `false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub max_attempts: Option<u32>,
    pub retry_on_empty: Option<bool>,

    /// Per-fetch wall-clock budget in seconds
    pub max_elapsed_secs: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 300,
            max_backoff_ms: 60_000,
            max_attempts: None,
            retry_on_empty: None,
            max_elapsed_secs: None,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        let mut policy = match self.max_attempts {
            Some(n) => RetryPolicy::bounded(n),
            None => RetryPolicy::unbounded(),
        }
        .with_initial_backoff(Duration::from_millis(self.initial_backoff_ms))
        .with_max_backoff(Duration::from_millis(self.max_backoff_ms));

        if let Some(retry) = self.retry_on_empty {
            policy = policy.with_empty_policy(if retry {
                EmptyResultPolicy::Retry
            } else {
                EmptyResultPolicy::Accept
            });
        }
        if let Some(secs) = self.max_elapsed_secs {
            policy = policy.with_max_elapsed(Duration::from_secs(secs));
        }
        policy
    }

    pub fn is_bounded(&self) -> bool {
        matches!(self.to_policy().mode, RetryMode::Bounded { .. }) || self.max_elapsed_secs.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded_and_retries_empty() {
        let policy = RetryConfig::default().to_policy();
        assert_eq!(policy.mode, RetryMode::Forever);
        assert_eq!(policy.on_empty, EmptyResultPolicy::Retry);
        assert_eq!(policy.initial_backoff, Duration::from_millis(300));
        assert_eq!(policy.max_backoff, Duration::from_secs(60));
        assert!(!RetryConfig::default().is_bounded());
    }

    #[test]
    fn test_bounded_accepts_empty_unless_overridden() {
        let mut config = RetryConfig {
            max_attempts: Some(3),
            ..Default::default()
        };
        let policy = config.to_policy();
        assert_eq!(policy.mode, RetryMode::Bounded { max_attempts: 3 });
        assert_eq!(policy.on_empty, EmptyResultPolicy::Accept);

        config.retry_on_empty = Some(true);
        assert_eq!(config.to_policy().on_empty, EmptyResultPolicy::Retry);
    }

    #[test]
    fn test_elapsed_budget() {
        let config = RetryConfig {
            max_elapsed_secs: Some(30),
            ..Default::default()
        };
        assert_eq!(config.to_policy().max_elapsed, Some(Duration::from_secs(30)));
        assert!(config.is_bounded());
    }
}
