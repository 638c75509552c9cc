//! Grid assembly: fetch each column for a window and fold it into a timeline

use crate::errors::{FetchError, PlanError};
use crate::fetcher::{ArchiveSource, RetryingFetcher};
use crate::grid::Grid;
use crate::types::{Column, Sample, TimeWindow};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

/// Lifetime of the grid a run assembles into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridStrategy {
    /// Fresh grid per window, emitted and dropped before the next window
    #[default]
    PerWindow,

    /// One grid accumulated across all windows, emitted once at the end
    Global,
}

impl FromStr for GridStrategy {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "per_window" | "window" => Ok(GridStrategy::PerWindow),
            "global" => Ok(GridStrategy::Global),
            other => Err(PlanError::InvalidArgument(format!(
                "unknown grid strategy '{other}' (expected per_window or global)"
            ))),
        }
    }
}

/// Shape of the emitted tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableLayout {
    /// One narrow `time,<name>` table per column
    #[default]
    PerTag,

    /// One `time,<col1>,<col2>,…` table holding every column
    Wide,
}

impl FromStr for TableLayout {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "per_tag" | "narrow" => Ok(TableLayout::PerTag),
            "wide" => Ok(TableLayout::Wide),
            other => Err(PlanError::InvalidArgument(format!(
                "unknown table layout '{other}' (expected per_tag or wide)"
            ))),
        }
    }
}

/// Outcome of folding one column into a grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReport {
    pub column: Column,

    /// Samples returned by the archive
    pub fetched: usize,

    /// Samples that landed inside the window
    pub applied: usize,
}

/// Builds per-second grids from a retrying fetcher
pub struct GridAssembler<'f, S> {
    fetcher: &'f RetryingFetcher<S>,
}

impl<'f, S: ArchiveSource> GridAssembler<'f, S> {
    pub fn new(fetcher: &'f RetryingFetcher<S>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher(&self) -> &RetryingFetcher<S> {
        self.fetcher
    }

    /// Seed a fresh grid for `window` and fill every column sequentially
    pub fn build_window_grid(
        &self,
        window: &TimeWindow,
        columns: &[Column],
    ) -> Result<Grid, FetchError> {
        let mut grid = Grid::for_window(columns.to_vec(), window);
        self.fill_columns(&mut grid, window)?;
        Ok(grid)
    }

    /// Seed any rows `window` adds to an existing grid, then fill every column
    ///
    /// Rows already present keep their values until a sample inside `window`
    /// overwrites them.
    pub fn assemble_into(
        &self,
        grid: &mut Grid,
        window: &TimeWindow,
    ) -> Result<Vec<ColumnReport>, FetchError> {
        let seeded = grid.seed_window(window);
        debug!(
            event_type = "grid_seeded",
            window = %window,
            new_rows = seeded,
            total_rows = grid.len(),
            "Seeded grid rows"
        );
        self.fill_columns(grid, window)
    }

    fn fill_columns(
        &self,
        grid: &mut Grid,
        window: &TimeWindow,
    ) -> Result<Vec<ColumnReport>, FetchError> {
        let columns = grid.columns().to_vec();
        let total = columns.len();
        let mut reports = Vec::with_capacity(total);
        for (index, column) in columns.iter().enumerate() {
            let samples = self.fetch_column(index, total, column, window)?;
            reports.push(Self::fold_column(grid, index, window, &samples));
        }
        Ok(reports)
    }

    /// Fetch one column's samples, logging progress as `index+1` of `total`
    pub fn fetch_column(
        &self,
        index: usize,
        total: usize,
        column: &Column,
        window: &TimeWindow,
    ) -> Result<Vec<Sample>, FetchError> {
        info!(
            event_type = "column_start",
            position = index + 1,
            total = total,
            name = %column.display_name,
            tag = %column.tag_id,
            window = %window,
            "Processing tag"
        );

        let samples = self.fetcher.fetch(&column.tag_id, window)?;

        if samples.is_empty() {
            info!(
                event_type = "column_no_data",
                tag = %column.tag_id,
                window = %window,
                "No data"
            );
        } else {
            info!(
                event_type = "column_fetched",
                tag = %column.tag_id,
                points = samples.len(),
                "Fetched points"
            );
        }

        Ok(samples)
    }

    /// Fold fetched samples into column `index` of `grid`
    pub fn fold_column(
        grid: &mut Grid,
        index: usize,
        window: &TimeWindow,
        samples: &[Sample],
    ) -> ColumnReport {
        let applied = grid.apply_samples(index, window, samples);
        let column = grid
            .columns()
            .get(index)
            .cloned()
            .unwrap_or_else(|| Column::new("", ""));

        debug!(
            event_type = "column_folded",
            tag = %column.tag_id,
            fetched = samples.len(),
            applied = applied,
            dropped = samples.len() - applied,
            "Folded samples into grid"
        );

        ColumnReport {
            column,
            fetched: samples.len(),
            applied,
        }
    }
}
