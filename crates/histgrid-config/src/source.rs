//! Archive source configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which archive adapter a run uses
///
/// Exactly one of `archive_dir` and `command` should be set; `command` wins
/// when both are.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory of `<tag>.csv` replay files
    pub archive_dir: Option<PathBuf>,

    /// External archive client program
    pub command: Option<String>,

    /// Arguments placed before `<tag> <start> <end>`
    pub command_args: Vec<String>,

    /// Client exit code meaning "permanently unusable"
    pub fatal_exit_code: i32,

    /// chrono pattern for archive timestamps (and client arguments)
    pub timestamp_pattern: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            archive_dir: None,
            command: None,
            command_args: Vec::new(),
            fatal_exit_code: 3,
            timestamp_pattern: None,
        }
    }
}

impl SourceConfig {
    pub fn is_configured(&self) -> bool {
        self.archive_dir.is_some() || self.command.is_some()
    }
}
