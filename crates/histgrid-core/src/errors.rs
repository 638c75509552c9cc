//! Error taxonomy shared by the extraction pipeline
//!
//! Transient archive conditions never appear here as errors: they are absorbed
//! by [`crate::RetryingFetcher`]. Everything below is either reported before
//! any fetch happens or terminates the run.

use std::path::PathBuf;
use thiserror::Error;

/// Malformed time range or planner configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Tag catalog could not be used
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Tag catalog '{path}' is unreadable")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tag catalog contains no valid 'display name,tag id' entries")]
    Empty,
}

/// Classified failure reported by an archive adapter
///
/// Adapters map whatever their client library raises onto one of these two
/// kinds; the fetcher retries the first and aborts on the second.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Query-level failure that may succeed on a later attempt
    #[error("recoverable archive failure: {0}")]
    Recoverable(String),

    /// The archive client is permanently unusable (e.g. failed initialization)
    #[error("fatal archive failure: {0}")]
    Fatal(String),
}

impl SourceError {
    pub fn recoverable(message: impl Into<String>) -> Self {
        SourceError::Recoverable(message.into())
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        SourceError::Fatal(message.into())
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Fatal(_))
    }
}

/// Unrecoverable fetch failure; aborts the whole run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Archive permanently unavailable while fetching tag '{tag_id}': {message}")]
    Fatal { tag_id: String, message: String },
}

/// Output sink failure
#[derive(Error, Debug)]
pub enum EmitError {
    #[error("Failed to write table to '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render table for '{path}'")]
    Render {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_classification() {
        assert!(SourceError::fatal("init failed").is_fatal());
        assert!(!SourceError::recoverable("timeout").is_fatal());
    }

    #[test]
    fn test_fetch_error_message_names_tag() {
        let err = FetchError::Fatal {
            tag_id: "DCS.PV01".to_string(),
            message: "client not initialized".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("DCS.PV01"));
        assert!(text.contains("client not initialized"));
    }
}
