//! External archive client adapter
//!
//! Runs a historian client program once per query:
//!
//! ```text
//! <program> [args…] <tag id> <start> <end>
//! ```
//!
//! `start` and `end` are rendered with the configured wall-clock pattern. The
//! program writes `time,value` CSV to stdout.
//!
//! ## Error Classification
//!
//! | Condition | Classification |
//! |-----------|----------------|
//! | Program not found | Fatal |
//! | Exit code == `fatal_exit_code` | Fatal (client cannot initialize) |
//! | Any other non-zero exit | Recoverable |
//! | Spawn failure other than not-found | Recoverable |
//! | Unparseable stdout | Recoverable |

use crate::records::parse_samples;
use histgrid_core::{
    format_millis, ArchiveSource, Sample, SourceError, TimeWindow, DEFAULT_TIMESTAMP_PATTERN,
};
use std::io::ErrorKind;
use std::process::Command;
use tracing::debug;

/// Exit code a client uses to report it is permanently unusable
pub const DEFAULT_FATAL_EXIT_CODE: i32 = 3;

#[derive(Debug, Clone)]
pub struct CommandArchive {
    program: String,
    args: Vec<String>,
    fatal_exit_code: i32,
    timestamp_pattern: String,
}

impl CommandArchive {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            fatal_exit_code: DEFAULT_FATAL_EXIT_CODE,
            timestamp_pattern: DEFAULT_TIMESTAMP_PATTERN.to_string(),
        }
    }

    /// Leading arguments placed before the tag id
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fatal_exit_code(mut self, code: i32) -> Self {
        self.fatal_exit_code = code;
        self
    }

    pub fn with_timestamp_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.timestamp_pattern = pattern.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ArchiveSource for CommandArchive {
    fn query(&self, tag_id: &str, window: &TimeWindow) -> Result<Vec<Sample>, SourceError> {
        let start = format_millis(window.start_ms, &self.timestamp_pattern);
        let end = format_millis(window.end_ms, &self.timestamp_pattern);

        debug!(
            event_type = "archive_command_start",
            program = %self.program,
            tag = %tag_id,
            start = %start,
            end = %end,
            "Running archive client"
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(tag_id)
            .arg(&start)
            .arg(&end)
            .output()
            .map_err(|e| {
                let message = format!("failed to run '{}': {e}", self.program);
                if e.kind() == ErrorKind::NotFound {
                    SourceError::Fatal(message)
                } else {
                    SourceError::Recoverable(message)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = format!("'{}' exited with {}: {stderr}", self.program, output.status);
            return Err(match output.status.code() {
                Some(code) if code == self.fatal_exit_code => SourceError::Fatal(message),
                _ => SourceError::Recoverable(message),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let samples = parse_samples(&stdout, Some(&self.timestamp_pattern))
            .map_err(|e| SourceError::recoverable(format!("unparseable client output: {e}")))?;

        Ok(samples
            .into_iter()
            .filter(|s| (window.start_ms..=window.end_ms).contains(&s.timestamp_ms))
            .collect())
    }

    fn name(&self) -> &str {
        "command"
    }
}
