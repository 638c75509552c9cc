//! Table I/O errors

use histgrid_core::EmitError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Table read/write errors
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to write table to '{path}'")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read table '{path}'")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in '{path}'")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Table '{path}' is not valid {encoding} text")]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },

    #[error("Table '{path}' has fewer than 2 columns")]
    NoValueColumns { path: PathBuf },

    #[error("No tables found under '{path}'")]
    NoTables { path: PathBuf },
}

impl TableError {
    /// File the error refers to
    pub fn path(&self) -> &Path {
        match self {
            TableError::WriteFailed { path, .. }
            | TableError::ReadFailed { path, .. }
            | TableError::Csv { path, .. }
            | TableError::Decode { path, .. }
            | TableError::NoValueColumns { path }
            | TableError::NoTables { path } => path,
        }
    }
}

impl From<TableError> for EmitError {
    fn from(err: TableError) -> Self {
        match err {
            TableError::WriteFailed { path, source } | TableError::ReadFailed { path, source } => {
                EmitError::Io { path, source }
            }
            other => EmitError::Render {
                path: other.path().to_path_buf(),
                source: Box::new(other),
            },
        }
    }
}
