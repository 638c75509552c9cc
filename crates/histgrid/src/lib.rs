//! Historian tag extraction onto a dense per-second grid.
//!
//! Pulls archived samples for a catalog of tags over an arbitrary time range,
//! one bounded window at a time, resamples them onto a per-second timeline and
//! writes CSV tables.
//!
//! ## Meta-Crate
//!
//! This crate re-exports the histgrid sub-crates. Code that needs only part of
//! the pipeline can depend on a sub-crate directly:
//!
//! - `histgrid-core` - data model, window planning, retrying fetches, grid assembly
//! - `histgrid-providers` - archive adapters (replay directory, external client)
//! - `histgrid-config` - layered configuration
//! - `histgrid-io` - CSV tables, stitching, coverage reports
//! - `histgrid-batch` - extraction engine
//! - `histgrid-cli` - the `histgrid` binary
//!
//! ## Features
//!
//! - `core` - always enabled
//! - `providers`, `config`, `io`, `batch` - the matching sub-crates
//! - `full` - everything (default)
//!
//! ## Basic Usage
//!
//! ```rust
//! use histgrid::{
//!     ArchiveSource, Column, GridAssembler, RetryPolicy, RetryingFetcher, Sample, SourceError,
//!     TimeWindow,
//! };
//!
//! struct OneSample;
//!
//! impl ArchiveSource for OneSample {
//!     fn query(&self, _tag: &str, window: &TimeWindow) -> Result<Vec<Sample>, SourceError> {
//!         Ok(vec![Sample::new(window.start_ms + 200, Some(3.5))])
//!     }
//! }
//!
//! let start = 1_751_328_000_000; // 2025-07-01 00:00:00
//! let window = TimeWindow::new(start, start + 1_000).unwrap();
//! let fetcher = RetryingFetcher::new(OneSample, RetryPolicy::unbounded());
//!
//! let grid = GridAssembler::new(&fetcher)
//!     .build_window_grid(&window, &[Column::new("A", "T1")])
//!     .unwrap();
//! assert_eq!(grid.len(), 2);
//! assert_eq!(grid.get(start / 1_000, 0), Some(3.5));
//! assert!(grid.get(start / 1_000 + 1, 0).unwrap().is_nan());
//! ```
//!
//! ## End to End
//!
//! ```rust,no_run
//! # #[cfg(feature = "full")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use histgrid::batch::{BatchConfig, ExtractionEngine};
//! use histgrid::io::CsvTableWriter;
//! use histgrid::providers::CsvArchive;
//! use histgrid::{RetryingFetcher, Settings, TagCatalog};
//!
//! let settings = Settings::load()?;
//! let catalog = TagCatalog::load("tags.txt")?.non_empty()?;
//! let fetcher = RetryingFetcher::new(CsvArchive::new("archive"), settings.retry.to_policy());
//! let engine = ExtractionEngine::new(
//!     fetcher,
//!     settings.extract.planner()?,
//!     BatchConfig::from(&settings.extract),
//! )?;
//! let mut writer = CsvTableWriter::from_config(&settings.export);
//! engine.run(&catalog, 1_751_328_000_000, 1_751_414_400_000, &mut writer)?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "full"))]
//! # fn main() {}
//! ```

// Re-export core (always available)
pub use histgrid_core as core;

#[cfg(feature = "providers")]
pub use histgrid_providers as providers;

#[cfg(feature = "config")]
pub use histgrid_config as config;

#[cfg(feature = "io")]
pub use histgrid_io as io;

#[cfg(feature = "batch")]
pub use histgrid_batch as batch;

// Commonly used types at the crate root
pub use histgrid_core::{
    ArchiveSource, BoundaryPolicy, Column, EmitError, FetchError, Grid, GridAssembler, GridSink,
    GridStrategy, PlanError, RetryPolicy, RetryingFetcher, Sample, SourceError, TableLayout,
    TagCatalog, TimeWindow, WindowPlanner,
};

#[cfg(feature = "config")]
pub use histgrid_config::Settings;

#[cfg(feature = "io")]
pub use histgrid_io::{CsvTableWriter, TableFormat};

#[cfg(feature = "batch")]
pub use histgrid_batch::{BatchConfig, EngineError, ExtractionEngine, RunSummary};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(!NAME.is_empty());
        assert!(!DESCRIPTION.is_empty());
    }

    #[test]
    fn test_core_exports() {
        let window = TimeWindow::new(0, 1_000).unwrap();
        let grid = Grid::for_window(vec![Column::new("A", "T1")], &window);
        assert_eq!(grid.len(), 2);
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_settings_export() {
        let settings = Settings::default();
        assert_eq!(settings.app.name, "histgrid");
    }
}
