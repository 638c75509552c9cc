//! Archive source adapters
//!
//! Concrete [`ArchiveSource`](histgrid_core::ArchiveSource) implementations.
//!
//! ## Supported Sources
//!
//! - `csv_archive` - directory of `<tag>.csv` files (replay, offline runs)
//! - `command` - external historian client program writing CSV to stdout
//!
//! ## Adding New Sources
//!
//! Implement `ArchiveSource::query` and map every client failure onto
//! `SourceError`:
//!
//! 1. **Recoverable**: timeouts, transient I/O, unparseable responses
//! 2. **Fatal**: the client cannot be initialized or is missing entirely
//!
//! Return an empty vector (not an error) when the archive simply has no data;
//! the retry policy decides whether that is retried.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use histgrid_core::{RetryPolicy, RetryingFetcher, TimeWindow};
//! use histgrid_providers::CsvArchive;
//!
//! let fetcher = RetryingFetcher::new(CsvArchive::new("archive/"), RetryPolicy::bounded(3));
//! let window = TimeWindow::new(0, 60_000).unwrap();
//! let samples = fetcher.fetch("DCS.FT101", &window).unwrap();
//! ```

pub mod command;
pub mod csv_archive;
pub mod records;

pub use command::{CommandArchive, DEFAULT_FATAL_EXIT_CODE};
pub use csv_archive::CsvArchive;
pub use records::{parse_samples, RecordError};
