//! Dense per-second timeline
//!
//! A [`Grid`] maps every epoch second of a window to one `f64` cell per column.
//! Rows are seeded before any fetch so that seconds with no archived sample
//! still appear in the output, filled with [`MISSING`].

use crate::types::{Column, Sample, TimeWindow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Missing-value sentinel
pub const MISSING: f64 = f64::NAN;

pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

/// Ordered `second -> row` mapping with fixed row width
#[derive(Debug, Clone, Default)]
pub struct Grid {
    columns: Vec<Column>,
    rows: BTreeMap<i64, Vec<f64>>,
}

impl Grid {
    /// Empty grid with no rows
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    /// Grid with every second of `window` seeded as missing
    pub fn for_window(columns: Vec<Column>, window: &TimeWindow) -> Self {
        let mut grid = Self::new(columns);
        grid.seed_window(window);
        grid
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Seed missing rows for every second of `window`
    ///
    /// Existing rows are left untouched, so a long-lived grid can be seeded
    /// window by window without clobbering earlier values. Returns the number
    /// of rows added.
    pub fn seed_window(&mut self, window: &TimeWindow) -> usize {
        let width = self.width();
        let mut inserted = 0;
        for second in window.first_second()..=window.last_second() {
            self.rows.entry(second).or_insert_with(|| {
                inserted += 1;
                vec![MISSING; width]
            });
        }
        inserted
    }

    /// Fold fetched samples into one column
    ///
    /// Each sample lands on its floored second. Samples outside `window` are
    /// dropped; later samples for the same second overwrite earlier ones; an
    /// absent value writes [`MISSING`]. Returns the number of samples applied.
    pub fn apply_samples(&mut self, column: usize, window: &TimeWindow, samples: &[Sample]) -> usize {
        if column >= self.width() {
            return 0;
        }
        let mut applied = 0;
        for sample in samples {
            let second = sample.second();
            if !window.contains_second(second) {
                continue;
            }
            self.insert_value(second, column, sample.value.unwrap_or(MISSING));
            applied += 1;
        }
        applied
    }

    /// Set one cell, creating a missing row if needed
    pub fn insert_value(&mut self, second: i64, column: usize, value: f64) {
        let width = self.width();
        if column >= width {
            return;
        }
        let row = self
            .rows
            .entry(second)
            .or_insert_with(|| vec![MISSING; width]);
        row[column] = value;
    }

    pub fn get(&self, second: i64, column: usize) -> Option<f64> {
        self.rows.get(&second).and_then(|row| row.get(column).copied())
    }

    pub fn row(&self, second: i64) -> Option<&[f64]> {
        self.rows.get(&second).map(Vec::as_slice)
    }

    /// Rows in ascending second order
    pub fn rows(&self) -> impl Iterator<Item = (i64, &[f64])> + '_ {
        self.rows.iter().map(|(second, row)| (*second, row.as_slice()))
    }

    pub fn first_second(&self) -> Option<i64> {
        self.rows.keys().next().copied()
    }

    pub fn last_second(&self) -> Option<i64> {
        self.rows.keys().next_back().copied()
    }

    /// Narrow copy holding a single column
    pub fn column_grid(&self, column: usize) -> Option<Grid> {
        let col = self.columns.get(column)?.clone();
        let rows = self
            .rows
            .iter()
            .map(|(second, row)| (*second, vec![row[column]]))
            .collect();
        Some(Grid {
            columns: vec![col],
            rows,
        })
    }

    /// Per-column fill statistics
    pub fn coverage(&self) -> Vec<ColumnCoverage> {
        self.columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let mut non_missing = 0;
                let mut latest_second = None;
                for (second, row) in &self.rows {
                    if !is_missing(row[index]) {
                        non_missing += 1;
                        latest_second = Some(*second);
                    }
                }
                ColumnCoverage {
                    display_name: column.display_name.clone(),
                    non_missing,
                    latest_second,
                }
            })
            .collect()
    }
}

/// How much of a column carries real values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnCoverage {
    pub display_name: String,
    pub non_missing: usize,

    /// Latest second with a non-missing value
    pub latest_second: Option<i64>,
}
