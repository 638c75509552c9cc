//! Per-variable stitching of extracted tables
//!
//! Walks a directory of per-window tables and produces one continuous table per
//! column name. Files are read in sorted path order; for a second present in
//! several files a later non-missing value wins, while a missing value only
//! fills seconds no earlier file covered.

use crate::errors::TableError;
use crate::naming::sanitize_variable_name;
use crate::reader::read_table;
use crate::table::{write_table, TableFormat};
use histgrid_config::{MissingValue, TextEncoding};
use histgrid_core::{is_missing, Column, Grid, DEFAULT_TIMESTAMP_PATTERN};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Stitching parameters
#[derive(Debug, Clone)]
pub struct StitchOptions {
    /// Encoding of the input tables
    pub input_encoding: TextEncoding,

    /// Only read files under top-level folders whose name starts with this
    pub folder_prefix: Option<String>,

    /// chrono pattern of the input and output `time` column
    pub timestamp_pattern: String,

    pub missing: MissingValue,
}

impl Default for StitchOptions {
    fn default() -> Self {
        Self {
            input_encoding: TextEncoding::Gbk,
            folder_prefix: None,
            timestamp_pattern: DEFAULT_TIMESTAMP_PATTERN.to_string(),
            missing: MissingValue::Nan,
        }
    }
}

/// One stitched output table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchedVariable {
    pub name: String,
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StitchSummary {
    pub files_read: usize,
    pub files_skipped: usize,
    pub variables: Vec<StitchedVariable>,
}

/// Stitch every `*.csv` under `input` into `<output>/<name>/<name>.csv` (UTF-8)
///
/// Unreadable tables and tables without value columns are skipped with a
/// warning. Files already under `output` are never read.
pub fn stitch_tables(
    input: &Path,
    output: &Path,
    options: &StitchOptions,
) -> Result<StitchSummary, TableError> {
    let files = collect_tables(input, output, options.folder_prefix.as_deref())?;
    info!(
        event_type = "stitch_start",
        input = %input.display(),
        files = files.len(),
        "Stitching tables"
    );

    let mut summary = StitchSummary::default();
    let mut series: BTreeMap<String, BTreeMap<i64, f64>> = BTreeMap::new();

    for path in &files {
        let grid = match read_table(path, options.input_encoding, &options.timestamp_pattern) {
            Ok(grid) => grid,
            Err(e) => {
                warn!(
                    event_type = "stitch_skip",
                    path = %path.display(),
                    error = %e,
                    "Skipping table"
                );
                summary.files_skipped += 1;
                continue;
            }
        };
        summary.files_read += 1;
        merge_grid(&mut series, &grid);
    }

    let format = TableFormat::default()
        .with_encoding(TextEncoding::Utf8)
        .with_missing(options.missing);
    let format = TableFormat {
        timestamp_pattern: options.timestamp_pattern.clone(),
        ..format
    };

    for (name, values) in series {
        let safe = sanitize_variable_name(&name);
        let path = output.join(&safe).join(format!("{safe}.csv"));
        let mut grid = Grid::new(vec![Column::new(name.as_str(), name.as_str())]);
        for (second, value) in values {
            grid.insert_value(second, 0, value);
        }
        let rows = write_table(&grid, &path, &format)?;
        info!(
            event_type = "stitch_variable",
            variable = %name,
            path = %path.display(),
            rows = rows,
            "Wrote stitched variable"
        );
        summary.variables.push(StitchedVariable { name, path, rows });
    }

    info!(
        event_type = "stitch_complete",
        files_read = summary.files_read,
        files_skipped = summary.files_skipped,
        variables = summary.variables.len(),
        "Stitching finished"
    );
    Ok(summary)
}

fn merge_grid(series: &mut BTreeMap<String, BTreeMap<i64, f64>>, grid: &Grid) {
    for (index, column) in grid.columns().iter().enumerate() {
        let values = series.entry(column.display_name.clone()).or_default();
        for (second, row) in grid.rows() {
            let value = row[index];
            match values.entry(second) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                Entry::Occupied(mut slot) => {
                    if !is_missing(value) {
                        slot.insert(value);
                    }
                }
            }
        }
    }
}

/// `*.csv` files under `input`, sorted, excluding anything inside `output`
fn collect_tables(
    input: &Path,
    output: &Path,
    folder_prefix: Option<&str>,
) -> Result<Vec<PathBuf>, TableError> {
    let output = output.canonicalize().unwrap_or_else(|_| output.to_path_buf());
    let mut files = Vec::new();
    let mut pending = vec![input.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|source| TableError::ReadFailed {
            path: dir.clone(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| TableError::ReadFailed {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                let resolved = path.canonicalize().unwrap_or_else(|_| path.clone());
                if !resolved.starts_with(&output) {
                    pending.push(path);
                }
            } else if is_csv(&path) && matches_prefix(input, &path, folder_prefix) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn matches_prefix(input: &Path, path: &Path, prefix: Option<&str>) -> bool {
    let Some(prefix) = prefix else {
        return true;
    };
    path.strip_prefix(input)
        .ok()
        .and_then(|relative| relative.components().next())
        .and_then(|first| first.as_os_str().to_str())
        .is_some_and(|first| first.starts_with(prefix))
}
