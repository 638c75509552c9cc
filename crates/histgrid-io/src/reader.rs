//! Read extracted tables back into grids

use crate::errors::TableError;
use crate::table::decode_text;
use csv::{ReaderBuilder, Trim};
use histgrid_config::TextEncoding;
use histgrid_core::{
    floor_to_second, normalize_epoch, parse_wall_clock, parse_wall_clock_with, Column, Grid,
    MISSING,
};
use std::path::Path;
use tracing::debug;

/// Read a `time,<col1>,…` table
///
/// The first column is the time column whatever its header says; every other
/// header becomes a column (display name and tag id both set to the header).
/// Rows whose time cannot be parsed are skipped; cells that are empty, `NaN`
/// or non-numeric read as missing. Duplicate seconds keep the last row.
pub fn read_table(path: &Path, encoding: TextEncoding, pattern: &str) -> Result<Grid, TableError> {
    let bytes = std::fs::read(path).map_err(|source| TableError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode_text(&bytes, encoding).ok_or_else(|| TableError::Decode {
        path: path.to_path_buf(),
        encoding: encoding.label(),
    })?;

    let csv_error = |source: csv::Error| TableError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(csv_error)?.clone();
    if headers.len() < 2 {
        return Err(TableError::NoValueColumns {
            path: path.to_path_buf(),
        });
    }
    let columns = headers
        .iter()
        .skip(1)
        .map(|name| Column::new(name, name))
        .collect();
    let mut grid = Grid::new(columns);

    let mut skipped_rows = 0usize;
    let mut unparsed_cells = 0usize;
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let Some(timestamp_ms) = record.get(0).and_then(|t| parse_time_cell(t, pattern)) else {
            skipped_rows += 1;
            continue;
        };
        let second = floor_to_second(timestamp_ms);
        for column in 0..grid.width() {
            let cell = record.get(column + 1).unwrap_or_default();
            let value = parse_value_cell(cell).unwrap_or_else(|| {
                unparsed_cells += 1;
                MISSING
            });
            grid.insert_value(second, column, value);
        }
    }

    debug!(
        event_type = "table_read",
        path = %path.display(),
        rows = grid.len(),
        columns = grid.width(),
        skipped_rows = skipped_rows,
        unparsed_cells = unparsed_cells,
        "Read table"
    );

    Ok(grid)
}

fn parse_time_cell(cell: &str, pattern: &str) -> Option<i64> {
    let digits = cell.strip_prefix('-').unwrap_or(cell);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return cell.parse::<i64>().ok().map(normalize_epoch);
    }
    parse_wall_clock_with(cell, pattern)
        .or_else(|_| parse_wall_clock(cell))
        .ok()
}

/// `None` when the cell is present but not a number
fn parse_value_cell(cell: &str) -> Option<f64> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("null") {
        return Some(MISSING);
    }
    cell.parse::<f64>().ok()
}
