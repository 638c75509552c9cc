//! Type definitions for tag extraction

use crate::errors::PlanError;
use crate::timestamp::{floor_to_second, format_millis, DEFAULT_TIMESTAMP_PATTERN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One output column: an archive tag and the label it is published under
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    /// Externally visible label (table header, per-tag directory name)
    pub display_name: String,

    /// Archive identifier used for queries; unique within a catalog
    pub tag_id: String,
}

impl Column {
    pub fn new(display_name: impl Into<String>, tag_id: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            tag_id: tag_id.into(),
        }
    }
}

/// Closed query interval `[start_ms, end_ms]` in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive start (epoch milliseconds)
    pub start_ms: i64,

    /// Inclusive end (epoch milliseconds)
    pub end_ms: i64,
}

impl TimeWindow {
    /// Create a window, rejecting `start > end`
    pub fn new(start_ms: i64, end_ms: i64) -> Result<Self, PlanError> {
        if start_ms > end_ms {
            return Err(PlanError::InvalidArgument(format!(
                "window start {} is after end {}",
                format_millis(start_ms, DEFAULT_TIMESTAMP_PATTERN),
                format_millis(end_ms, DEFAULT_TIMESTAMP_PATTERN)
            )));
        }
        Ok(Self { start_ms, end_ms })
    }

    /// First grid second covered by this window
    pub fn first_second(&self) -> i64 {
        floor_to_second(self.start_ms)
    }

    /// Last grid second covered by this window (inclusive)
    pub fn last_second(&self) -> i64 {
        floor_to_second(self.end_ms)
    }

    /// Whether a truncated sample second falls inside the window
    pub fn contains_second(&self, second: i64) -> bool {
        (self.first_second()..=self.last_second()).contains(&second)
    }

    /// Smallest window covering both `self` and `other`
    pub fn span(&self, other: &TimeWindow) -> TimeWindow {
        TimeWindow {
            start_ms: self.start_ms.min(other.start_ms),
            end_ms: self.end_ms.max(other.end_ms),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ~ {}",
            format_millis(self.start_ms, DEFAULT_TIMESTAMP_PATTERN),
            format_millis(self.end_ms, DEFAULT_TIMESTAMP_PATTERN)
        )
    }
}

/// One archived observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Observation instant in epoch milliseconds (sub-second precision allowed)
    pub timestamp_ms: i64,

    /// Archived value; `None` when the archive reported no value
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(timestamp_ms: i64, value: Option<f64>) -> Self {
        Self {
            timestamp_ms,
            value,
        }
    }

    /// Grid second this sample lands on
    pub fn second(&self) -> i64 {
        floor_to_second(self.timestamp_ms)
    }
}
