//! Directory-backed replay archive
//!
//! Serves samples from a directory holding one `<tag>.csv` file per tag, each
//! with `time,value` rows. Useful for replaying exported historian data and for
//! running the pipeline without a live archive client.
//!
//! ## Error Classification
//!
//! | Condition | Classification |
//! |-----------|----------------|
//! | Archive directory missing | Fatal |
//! | Tag file missing | Empty result |
//! | Tag file unreadable | Recoverable |
//! | Malformed row | Recoverable |

use crate::records::parse_samples;
use histgrid_core::{ArchiveSource, Sample, SourceError, TimeWindow};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Archive reading `<root>/<tag>.csv`
#[derive(Debug, Clone)]
pub struct CsvArchive {
    root: PathBuf,
    timestamp_pattern: Option<String>,
}

impl CsvArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            timestamp_pattern: None,
        }
    }

    /// Parse wall-clock times with this chrono pattern before the defaults
    pub fn with_timestamp_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.timestamp_pattern = Some(pattern.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding samples for `tag_id`
    ///
    /// Path separators and characters invalid in file names become `_`.
    pub fn tag_path(&self, tag_id: &str) -> PathBuf {
        let stem: String = tag_id
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        self.root.join(format!("{stem}.csv"))
    }
}

impl ArchiveSource for CsvArchive {
    fn query(&self, tag_id: &str, window: &TimeWindow) -> Result<Vec<Sample>, SourceError> {
        if !self.root.is_dir() {
            return Err(SourceError::fatal(format!(
                "archive directory '{}' is not available",
                self.root.display()
            )));
        }

        let path = self.tag_path(tag_id);
        let buffer = match std::fs::read_to_string(&path) {
            Ok(buffer) => buffer,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(
                    event_type = "archive_tag_missing",
                    tag = %tag_id,
                    path = %path.display(),
                    "No archive file for tag"
                );
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(SourceError::recoverable(format!(
                    "failed to read '{}': {e}",
                    path.display()
                )))
            }
        };

        let samples = parse_samples(&buffer, self.timestamp_pattern.as_deref()).map_err(|e| {
            SourceError::recoverable(format!("failed to parse '{}': {e}", path.display()))
        })?;

        let in_window: Vec<Sample> = samples
            .into_iter()
            .filter(|s| (window.start_ms..=window.end_ms).contains(&s.timestamp_ms))
            .collect();

        debug!(
            event_type = "archive_query",
            tag = %tag_id,
            window = %window,
            points = in_window.len(),
            "Read samples from archive file"
        );

        Ok(in_window)
    }

    fn name(&self) -> &str {
        "csv-archive"
    }
}
