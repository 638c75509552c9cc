//! Column coverage reports for grids and existing tables

use crate::errors::TableError;
use crate::reader::read_table;
use histgrid_config::TextEncoding;
use histgrid_core::{format_seconds, Grid};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

const NAME_WIDTH: usize = 32;
const COUNT_WIDTH: usize = 16;
const RULE_WIDTH: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageEntry {
    pub column: String,
    pub non_null_count: usize,
    pub latest_non_null_ts: Option<String>,

    #[serde(skip)]
    latest_second: Option<i64>,
}

/// Coverage of every column of one table, most recently populated first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    pub source: String,
    pub rows: usize,
    pub entries: Vec<CoverageEntry>,
}

impl CoverageReport {
    /// Columns are ordered by latest non-missing second, descending; columns
    /// that never carry a value come last in their original order.
    pub fn from_grid(source: impl Into<String>, grid: &Grid, pattern: &str) -> Self {
        let mut entries: Vec<CoverageEntry> = grid
            .coverage()
            .into_iter()
            .map(|c| CoverageEntry {
                column: c.display_name,
                non_null_count: c.non_missing,
                latest_non_null_ts: c.latest_second.map(|s| format_seconds(s, pattern)),
                latest_second: c.latest_second,
            })
            .collect();
        entries.sort_by(|a, b| b.latest_second.cmp(&a.latest_second));

        Self {
            source: source.into(),
            rows: grid.len(),
            entries,
        }
    }

    /// Read a table and report its coverage
    pub fn from_file(path: &Path, encoding: TextEncoding, pattern: &str) -> Result<Self, TableError> {
        let grid = read_table(path, encoding, pattern)?;
        Ok(Self::from_grid(path.display().to_string(), &grid, pattern))
    }

    /// Fixed-width text block
    pub fn render_text(&self) -> String {
        let rule = "-".repeat(RULE_WIDTH);
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(out, "Table: {}", self.source);
        let _ = writeln!(
            out,
            "{:<NAME_WIDTH$}{:<COUNT_WIDTH$}{}",
            "column", "non_null_count", "latest_non_null_ts"
        );
        let _ = writeln!(out, "{rule}");
        for entry in &self.entries {
            let _ = writeln!(
                out,
                "{:<NAME_WIDTH$}{:<COUNT_WIDTH$}{}",
                entry.column,
                entry.non_null_count,
                entry.latest_non_null_ts.as_deref().unwrap_or("None")
            );
        }
        let _ = writeln!(out, "{rule}");
        out
    }
}

/// Reports as a pretty-printed JSON array
pub fn reports_to_json(reports: &[CoverageReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}
