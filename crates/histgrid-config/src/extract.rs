//! Extraction run configuration

use histgrid_core::{
    BoundaryPolicy, GridStrategy, PlanError, TableLayout, WindowPlanner,
    DEFAULT_TIMESTAMP_PATTERN,
};
use serde::{Deserialize, Serialize};

/// Window planning, grid shape and concurrency for an extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Length of each archive query window in minutes
    pub step_minutes: u64,

    /// Whether the requested end instant is inclusive
    pub boundary_policy: BoundaryPolicy,

    /// Per-window grids or one run-wide accumulator
    pub strategy: GridStrategy,

    /// Narrow per-tag tables or one wide table
    pub layout: TableLayout,

    /// Columns fetched concurrently inside a window (1 = sequential, 0 = one per CPU)
    pub column_workers: usize,

    /// Windows assembled concurrently under the per-window strategy
    pub window_batch: usize,

    /// chrono pattern for `--start` / `--end`
    pub timestamp_pattern: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            step_minutes: 10,
            boundary_policy: BoundaryPolicy::RightOpen,
            strategy: GridStrategy::PerWindow,
            layout: TableLayout::PerTag,
            column_workers: 1,
            window_batch: 1,
            timestamp_pattern: DEFAULT_TIMESTAMP_PATTERN.to_string(),
        }
    }
}

impl ExtractConfig {
    pub fn planner(&self) -> Result<WindowPlanner, PlanError> {
        WindowPlanner::from_minutes(self.step_minutes, self.boundary_policy)
    }

    /// Column worker count, auto-detecting when set to 0
    pub fn column_workers(&self) -> usize {
        match self.column_workers {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }

    /// Window batch size, never below 1
    pub fn window_batch(&self) -> usize {
        self.window_batch.max(1)
    }
}
