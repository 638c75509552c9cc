//! CSV sink for completed grids

use crate::errors::TableError;
use crate::naming::{sanitize_folder_name, table_file_name};
use crate::table::{write_table, TableFormat};
use histgrid_config::ExportConfig;
use histgrid_core::{EmitError, Emission, Grid, GridSink, TableLayout, TimeWindow};
use std::path::{Path, PathBuf};
use tracing::info;

/// One table written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenTable {
    pub path: PathBuf,
    pub rows: usize,
}

/// Writes each emission as CSV under `root`
///
/// - [`TableLayout::PerTag`]: one file per column,
///   `<root>/<display name>/<display name>_<start>-<end>.csv`
/// - [`TableLayout::Wide`]: one file per emission, `<root>/<prefix>_<start>-<end>.csv`
#[derive(Debug, Clone)]
pub struct CsvTableWriter {
    root: PathBuf,
    prefix: String,
    format: TableFormat,
    written: Vec<WrittenTable>,
}

impl CsvTableWriter {
    pub fn new(root: impl Into<PathBuf>, prefix: impl Into<String>, format: TableFormat) -> Self {
        Self {
            root: root.into(),
            prefix: prefix.into(),
            format,
            written: Vec::new(),
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(&config.output_dir, &config.prefix, TableFormat::from(config))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> &TableFormat {
        &self.format
    }

    /// Tables written so far, in emission order
    pub fn written(&self) -> &[WrittenTable] {
        &self.written
    }

    /// Path of the per-tag table for `display_name`
    pub fn per_tag_path(&self, display_name: &str, span: &TimeWindow) -> PathBuf {
        let folder = sanitize_folder_name(display_name);
        let file = table_file_name(&folder, span);
        self.root.join(folder).join(file)
    }

    /// Path of the wide table for `span`
    pub fn wide_path(&self, span: &TimeWindow) -> PathBuf {
        self.root
            .join(table_file_name(&sanitize_folder_name(&self.prefix), span))
    }

    fn write(&mut self, grid: &Grid, path: PathBuf) -> Result<(), TableError> {
        let rows = write_table(grid, &path, &self.format)?;
        info!(
            event_type = "table_written",
            path = %path.display(),
            rows = rows,
            columns = grid.width(),
            "Wrote table"
        );
        self.written.push(WrittenTable { path, rows });
        Ok(())
    }
}

impl GridSink for CsvTableWriter {
    fn emit(&mut self, emission: &Emission<'_>) -> Result<(), EmitError> {
        match emission.layout {
            TableLayout::Wide => {
                let path = self.wide_path(&emission.span);
                self.write(emission.grid, path)?;
            }
            TableLayout::PerTag => {
                for index in 0..emission.grid.width() {
                    let Some(narrow) = emission.grid.column_grid(index) else {
                        continue;
                    };
                    let path =
                        self.per_tag_path(&narrow.columns()[0].display_name, &emission.span);
                    self.write(&narrow, path)?;
                }
            }
        }
        Ok(())
    }
}
