//! Core historian extraction algorithms
//!
//! Turns sparse archive samples into dense per-second tables.
//!
//! ## Features
//!
//! - Window planning: bounded sub-windows with right-open or closed boundaries
//! - Retrying fetches: exponential backoff with a cap, fatal vs recoverable classification
//! - Grid assembly: pre-seeded per-second timeline, second truncation, window clipping,
//!   last-write-wins deduplication and NaN filling
//! - Tag catalog: `display name,tag id` parsing with first-occurrence deduplication
//!
//! ## Pipeline
//!
//! ```text
//! TagCatalog ──► WindowPlanner ──► GridAssembler ──► GridSink
//!                                      │
//!                                RetryingFetcher ──► ArchiveSource
//! ```

pub mod assembler;
pub mod catalog;
pub mod errors;
pub mod fetcher;
pub mod grid;
pub mod retry;
pub mod sink;
pub mod timestamp;
pub mod types;
pub mod window;

// Test utilities (only available in test builds or with test-utils feature)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export commonly used types
pub use assembler::{ColumnReport, GridAssembler, GridStrategy, TableLayout};
pub use catalog::{CatalogStats, TagCatalog};
pub use errors::{CatalogError, EmitError, FetchError, PlanError, SourceError};
pub use fetcher::{
    ArchiveSource, FetchMetrics, FetchMetricsSnapshot, RetryingFetcher, Sleeper, ThreadSleeper,
};
pub use grid::{is_missing, ColumnCoverage, Grid, MISSING};
pub use retry::{Backoff, EmptyResultPolicy, RetryMode, RetryPolicy};
pub use sink::{CollectedGrid, CollectingSink, Emission, GridSink};
pub use timestamp::{
    floor_to_second, format_millis, format_seconds, normalize_epoch, parse_wall_clock,
    parse_wall_clock_with, DEFAULT_TIMESTAMP_PATTERN, FILE_STAMP_PATTERN,
};
pub use types::{Column, Sample, TimeWindow};
pub use window::{BoundaryPolicy, WindowPlanner};
