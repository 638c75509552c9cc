//! Time range partitioning
//!
//! Large extraction ranges are split into bounded sub-windows so each archive
//! query stays small. Adjacent windows share their seam instant: the next
//! window starts exactly where the previous one ended, so the per-second grid
//! sees the seam second from both sides and last-write-wins keeps it once.

use crate::errors::PlanError;
use crate::timestamp::MILLIS_PER_SECOND;
use crate::types::TimeWindow;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// How the requested end instant is treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// The requested end is exclusive: the last window stops one second short
    #[default]
    RightOpen,

    /// The requested end is inclusive
    Closed,
}

impl std::str::FromStr for BoundaryPolicy {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "right_open" | "open" => Ok(BoundaryPolicy::RightOpen),
            "closed" => Ok(BoundaryPolicy::Closed),
            other => Err(PlanError::InvalidArgument(format!(
                "unknown boundary policy '{other}' (expected right_open or closed)"
            ))),
        }
    }
}

/// Splits `[start, end]` into windows no longer than `step`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlanner {
    step_ms: i64,
    policy: BoundaryPolicy,
}

impl WindowPlanner {
    /// Create a planner; `step` must be at least one millisecond
    pub fn new(step: Duration, policy: BoundaryPolicy) -> Result<Self, PlanError> {
        let step_ms = i64::try_from(step.as_millis()).unwrap_or(i64::MAX);
        if step_ms <= 0 {
            return Err(PlanError::InvalidArgument(format!(
                "window step must be positive, got {step:?}"
            )));
        }
        Ok(Self { step_ms, policy })
    }

    /// Planner with a step given in whole minutes
    pub fn from_minutes(minutes: u64, policy: BoundaryPolicy) -> Result<Self, PlanError> {
        Self::new(Duration::from_secs(minutes.saturating_mul(60)), policy)
    }

    pub fn step_ms(&self) -> i64 {
        self.step_ms
    }

    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    /// Partition `[start_ms, end_ms]` into ordered, contiguous windows
    ///
    /// - `start > end` is rejected.
    /// - `start == end` yields the single instant window `[start, start]`.
    /// - Under [`BoundaryPolicy::RightOpen`] the last window ends at `end - 1s`;
    ///   a range shorter than one second therefore yields no windows.
    pub fn split(&self, start_ms: i64, end_ms: i64) -> Result<Vec<TimeWindow>, PlanError> {
        if start_ms > end_ms {
            return Err(PlanError::InvalidArgument(format!(
                "start must not be after end ({start_ms} > {end_ms})"
            )));
        }

        if start_ms == end_ms {
            return Ok(vec![TimeWindow {
                start_ms,
                end_ms,
            }]);
        }

        let last = match self.policy {
            BoundaryPolicy::RightOpen => end_ms.saturating_sub(MILLIS_PER_SECOND),
            BoundaryPolicy::Closed => end_ms,
        };

        if last < start_ms {
            debug!(
                event_type = "plan_empty",
                start_ms = start_ms,
                end_ms = end_ms,
                "Range shorter than one second under right-open policy"
            );
            return Ok(Vec::new());
        }

        let mut windows = Vec::new();
        let mut cursor = start_ms;
        loop {
            let candidate = cursor.saturating_add(self.step_ms);
            windows.push(TimeWindow {
                start_ms: cursor,
                end_ms: candidate.min(last),
            });
            if candidate >= last {
                break;
            }
            cursor = candidate;
        }

        debug!(
            event_type = "plan_complete",
            windows = windows.len(),
            step_ms = self.step_ms,
            policy = ?self.policy,
            "Planned extraction windows"
        );

        Ok(windows)
    }
}
