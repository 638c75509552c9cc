//! Extraction engine
//!
//! Drives catalog → planner → assembler → sink for one run. Column fetches
//! inside a window and whole windows under the per-window strategy can run on a
//! bounded rayon pool; results are always folded and emitted in catalog and
//! window order, so parallel output matches a sequential run.

use histgrid_config::ExtractConfig;
use histgrid_core::{
    ArchiveSource, CatalogError, Column, ColumnReport, EmitError, Emission, FetchError,
    FetchMetricsSnapshot, Grid, GridAssembler, GridSink, GridStrategy, PlanError,
    RetryingFetcher, TableLayout, TagCatalog, TimeWindow, WindowPlanner,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Grid shape and concurrency for a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchConfig {
    pub strategy: GridStrategy,
    pub layout: TableLayout,

    /// Columns fetched concurrently inside a window (1 = sequential)
    pub column_workers: usize,

    /// Windows assembled concurrently under [`GridStrategy::PerWindow`]
    pub window_batch: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            strategy: GridStrategy::PerWindow,
            layout: TableLayout::PerTag,
            column_workers: 1,
            window_batch: 1,
        }
    }
}

impl From<&ExtractConfig> for BatchConfig {
    fn from(config: &ExtractConfig) -> Self {
        Self {
            strategy: config.strategy,
            layout: config.layout,
            column_workers: config.column_workers(),
            window_batch: config.window_batch(),
        }
    }
}

impl BatchConfig {
    fn pool_threads(&self) -> usize {
        self.column_workers.max(self.window_batch).max(1)
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Windows planned for the requested range
    pub windows: usize,

    /// Grids handed to the sink
    pub emissions: usize,

    /// Rows across all emitted grids
    pub rows_emitted: usize,

    pub metrics: FetchMetricsSnapshot,
}

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid extraction request")]
    Plan(#[from] PlanError),

    #[error("Tag catalog unusable")]
    Catalog(#[from] CatalogError),

    #[error("Archive fetch failed")]
    Fetch(#[from] FetchError),

    #[error("Failed to emit table")]
    Emit(#[from] EmitError),

    #[error("Failed to start worker pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Runs extractions against one archive source
pub struct ExtractionEngine<S> {
    fetcher: RetryingFetcher<S>,
    planner: WindowPlanner,
    config: BatchConfig,
    pool: Option<rayon::ThreadPool>,
}

impl<S: ArchiveSource> ExtractionEngine<S> {
    /// Build an engine; a worker pool is started only when the config asks for
    /// more than one worker
    pub fn new(
        fetcher: RetryingFetcher<S>,
        planner: WindowPlanner,
        config: BatchConfig,
    ) -> Result<Self, EngineError> {
        let threads = config.pool_threads();
        let pool = if threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("histgrid-worker-{i}"))
                    .build()?,
            )
        } else {
            None
        };

        debug!(
            event_type = "engine_created",
            strategy = ?config.strategy,
            layout = ?config.layout,
            column_workers = config.column_workers,
            window_batch = config.window_batch,
            pool_threads = if pool.is_some() { threads } else { 0 },
            "Extraction engine ready"
        );

        Ok(Self {
            fetcher,
            planner,
            config,
            pool,
        })
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn planner(&self) -> &WindowPlanner {
        &self.planner
    }

    pub fn fetcher(&self) -> &RetryingFetcher<S> {
        &self.fetcher
    }

    /// Extract every catalog column over `[start_ms, end_ms]` into `sink`
    ///
    /// The range is validated and the catalog checked before any fetch. A
    /// fatal fetch error or a sink error stops the run; grids already emitted
    /// stay emitted.
    pub fn run<K>(
        &self,
        catalog: &TagCatalog,
        start_ms: i64,
        end_ms: i64,
        sink: &mut K,
    ) -> Result<RunSummary, EngineError>
    where
        K: GridSink + ?Sized,
    {
        let windows = self.planner.split(start_ms, end_ms)?;
        if catalog.is_empty() {
            return Err(CatalogError::Empty.into());
        }
        let columns = catalog.columns();

        info!(
            event_type = "run_start",
            columns = columns.len(),
            windows = windows.len(),
            strategy = ?self.config.strategy,
            layout = ?self.config.layout,
            "Starting extraction"
        );
        if windows.is_empty() {
            warn!(
                event_type = "run_no_windows",
                start_ms = start_ms,
                end_ms = end_ms,
                "Requested range holds no whole second, nothing to extract"
            );
        }

        let mut summary = RunSummary {
            windows: windows.len(),
            emissions: 0,
            rows_emitted: 0,
            metrics: FetchMetricsSnapshot::default(),
        };

        match self.config.strategy {
            GridStrategy::PerWindow => self.run_per_window(&windows, columns, sink, &mut summary)?,
            GridStrategy::Global => self.run_global(&windows, columns, sink, &mut summary)?,
        }

        summary.metrics = self.fetcher.metrics().snapshot();
        info!(
            event_type = "run_complete",
            windows = summary.windows,
            emissions = summary.emissions,
            rows = summary.rows_emitted,
            attempts = summary.metrics.attempts,
            retries = summary.metrics.retries,
            give_ups = summary.metrics.give_ups,
            "Extraction finished"
        );
        Ok(summary)
    }

    fn run_per_window<K>(
        &self,
        windows: &[TimeWindow],
        columns: &[Column],
        sink: &mut K,
        summary: &mut RunSummary,
    ) -> Result<(), EngineError>
    where
        K: GridSink + ?Sized,
    {
        let batch = self.config.window_batch.max(1);
        for (batch_index, chunk) in windows.chunks(batch).enumerate() {
            let base = batch_index * batch;
            let grids: Vec<Result<Grid, FetchError>> = match &self.pool {
                Some(pool) if chunk.len() > 1 => pool.install(|| {
                    chunk
                        .par_iter()
                        .map(|window| self.window_grid(window, columns))
                        .collect()
                }),
                // Sequential: build lazily so a fatal error stops further fetches
                _ => {
                    for (offset, window) in chunk.iter().enumerate() {
                        let grid = self.window_grid(window, columns)?;
                        self.emit(sink, &grid, *window, Some(base + offset), summary)?;
                    }
                    continue;
                }
            };

            for (offset, (window, grid)) in chunk.iter().zip(grids).enumerate() {
                let grid = grid?;
                self.emit(sink, &grid, *window, Some(base + offset), summary)?;
            }
        }
        Ok(())
    }

    fn run_global<K>(
        &self,
        windows: &[TimeWindow],
        columns: &[Column],
        sink: &mut K,
        summary: &mut RunSummary,
    ) -> Result<(), EngineError>
    where
        K: GridSink + ?Sized,
    {
        let (Some(first), Some(last)) = (windows.first(), windows.last()) else {
            return Ok(());
        };
        let mut grid = Grid::new(columns.to_vec());
        for (index, window) in windows.iter().enumerate() {
            info!(
                event_type = "window_start",
                position = index + 1,
                total = windows.len(),
                window = %window,
                "Processing window"
            );
            self.fill_window(&mut grid, window)?;
        }
        self.emit(sink, &grid, first.span(last), None, summary)
    }

    fn window_grid(&self, window: &TimeWindow, columns: &[Column]) -> Result<Grid, FetchError> {
        info!(
            event_type = "window_start",
            window = %window,
            "Processing window"
        );
        let mut grid = Grid::for_window(columns.to_vec(), window);
        self.fill_window(&mut grid, window)?;
        Ok(grid)
    }

    /// Seed `window` into `grid` and fold every column, fetching in parallel
    /// when column workers are configured
    fn fill_window(
        &self,
        grid: &mut Grid,
        window: &TimeWindow,
    ) -> Result<Vec<ColumnReport>, FetchError> {
        let assembler = GridAssembler::new(&self.fetcher);
        let pool = match &self.pool {
            Some(pool) if self.config.column_workers > 1 && grid.width() > 1 => pool,
            _ => return assembler.assemble_into(grid, window),
        };

        grid.seed_window(window);
        let columns = grid.columns().to_vec();
        let total = columns.len();
        let fetched: Vec<Result<_, FetchError>> = pool.install(|| {
            columns
                .par_iter()
                .enumerate()
                .map(|(index, column)| assembler.fetch_column(index, total, column, window))
                .collect()
        });

        let mut reports = Vec::with_capacity(total);
        for (index, samples) in fetched.into_iter().enumerate() {
            let samples = samples?;
            reports.push(GridAssembler::<S>::fold_column(grid, index, window, &samples));
        }
        Ok(reports)
    }

    fn emit<K>(
        &self,
        sink: &mut K,
        grid: &Grid,
        span: TimeWindow,
        window_index: Option<usize>,
        summary: &mut RunSummary,
    ) -> Result<(), EngineError>
    where
        K: GridSink + ?Sized,
    {
        sink.emit(&Emission {
            grid,
            span,
            layout: self.config.layout,
            window_index,
        })?;
        summary.emissions += 1;
        summary.rows_emitted += grid.len();
        log_coverage(grid, &span);
        Ok(())
    }
}

fn log_coverage(grid: &Grid, span: &TimeWindow) {
    let coverage = grid.coverage();
    let populated = coverage.iter().filter(|c| c.non_missing > 0).count();
    info!(
        event_type = "grid_emitted",
        span = %span,
        rows = grid.len(),
        columns = coverage.len(),
        populated_columns = populated,
        "Emitted grid"
    );
    for column in &coverage {
        debug!(
            event_type = "column_coverage",
            name = %column.display_name,
            non_missing = column.non_missing,
            latest_second = ?column.latest_second,
            "Column coverage"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use histgrid_core::test_utils::{sample, RecordingSleeper, ScriptedSource};
    use histgrid_core::{
        is_missing, BoundaryPolicy, CollectingSink, RetryPolicy, SourceError,
    };
    use std::time::Duration;

    const T0: i64 = 1_751_328_000_000; // 2025-07-01 00:00:00

    fn planner(step_secs: u64) -> WindowPlanner {
        WindowPlanner::new(Duration::from_secs(step_secs), BoundaryPolicy::RightOpen).unwrap()
    }

    fn catalog() -> TagCatalog {
        TagCatalog::parse("A,T1\nB,T2\n")
    }

    fn source() -> ScriptedSource {
        ScriptedSource::new()
            .with_series(
                "T1",
                vec![sample(T0, 1.0), sample(T0 + 4_500, 2.0), sample(T0 + 9_000, 3.0)],
            )
            .with_series("T2", vec![sample(T0 + 1_000, 10.0), sample(T0 + 6_000, 20.0)])
    }

    fn engine(source: ScriptedSource, config: BatchConfig) -> ExtractionEngine<ScriptedSource> {
        let fetcher = RetryingFetcher::new(source, RetryPolicy::bounded(1))
            .with_sleeper(RecordingSleeper::default());
        ExtractionEngine::new(fetcher, planner(5), config).unwrap()
    }

    fn flatten(sink: &CollectingSink, column: usize) -> Vec<(i64, f64)> {
        sink.emitted
            .iter()
            .flat_map(|c| c.grid.rows().map(move |(s, row)| (s, row[column])))
            .filter(|(_, v)| !is_missing(*v))
            .collect()
    }

    #[test]
    fn test_per_window_emits_in_order() {
        let engine = engine(source(), BatchConfig::default());
        let mut sink = CollectingSink::new();
        let summary = engine.run(&catalog(), T0, T0 + 10_000, &mut sink).unwrap();

        assert_eq!(summary.windows, 2);
        assert_eq!(summary.emissions, 2);
        let indices: Vec<_> = sink.emitted.iter().map(|c| c.window_index).collect();
        assert_eq!(indices, vec![Some(0), Some(1)]);
        // Right-open: [T0, T0+5s] and [T0+5s, T0+9s]
        assert_eq!(sink.emitted[0].grid.len(), 6);
        assert_eq!(sink.emitted[1].grid.len(), 5);
        assert_eq!(summary.rows_emitted, 11);
        assert_eq!(
            flatten(&sink, 0),
            vec![(T0 / 1_000, 1.0), (T0 / 1_000 + 4, 2.0), (T0 / 1_000 + 9, 3.0)]
        );
    }

    #[test]
    fn test_parallel_run_matches_sequential() {
        let sequential = {
            let engine = engine(source(), BatchConfig::default());
            let mut sink = CollectingSink::new();
            engine.run(&catalog(), T0, T0 + 20_000, &mut sink).unwrap();
            sink
        };
        let parallel = {
            let config = BatchConfig {
                column_workers: 4,
                window_batch: 3,
                ..BatchConfig::default()
            };
            let engine = engine(source(), config);
            let mut sink = CollectingSink::new();
            engine.run(&catalog(), T0, T0 + 20_000, &mut sink).unwrap();
            sink
        };

        assert_eq!(sequential.emitted.len(), parallel.emitted.len());
        for (a, b) in sequential.emitted.iter().zip(&parallel.emitted) {
            assert_eq!(a.span, b.span);
            assert_eq!(a.window_index, b.window_index);
        }
        for column in 0..2 {
            assert_eq!(flatten(&sequential, column), flatten(&parallel, column));
        }
    }

    #[test]
    fn test_global_strategy_emits_once() {
        let config = BatchConfig {
            strategy: GridStrategy::Global,
            layout: TableLayout::Wide,
            ..BatchConfig::default()
        };
        let engine = engine(source(), config);
        let mut sink = CollectingSink::new();
        let summary = engine.run(&catalog(), T0, T0 + 10_000, &mut sink).unwrap();

        assert_eq!(summary.emissions, 1);
        let emitted = &sink.emitted[0];
        assert_eq!(emitted.window_index, None);
        assert_eq!(emitted.layout, TableLayout::Wide);
        assert_eq!(emitted.span, TimeWindow::new(T0, T0 + 9_000).unwrap());
        // Shared seam second appears once
        assert_eq!(emitted.grid.len(), 10);
        assert_eq!(emitted.grid.get(T0 / 1_000 + 6, 1), Some(20.0));
    }

    #[test]
    fn test_fatal_error_stops_run() {
        let source = source().respond("T2", Err(SourceError::fatal("client not initialized")));
        let engine = engine(source, BatchConfig::default());
        let mut sink = CollectingSink::new();

        let err = engine.run(&catalog(), T0, T0 + 10_000, &mut sink).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Fetch(FetchError::Fatal { ref tag_id, .. }) if tag_id == "T2"
        ));
        assert!(sink.emitted.is_empty());
        assert_eq!(engine.fetcher().source().calls().len(), 2);
    }

    fn window_indices(sink: &CollectingSink) -> Vec<Option<usize>> {
        sink.emitted.iter().map(|c| c.window_index).collect()
    }

    #[test]
    fn test_first_fatal_in_window_order_under_parallel_batch() {
        // Windows start at T0, +5s, +10s, +15s; batches are [0, 1] and [2, 3]
        let source = source()
            .fail_window("T2", T0 + 10_000, SourceError::fatal("lost license in window 2"))
            .fail_window("T2", T0 + 15_000, SourceError::fatal("lost license in window 3"));
        let config = BatchConfig {
            window_batch: 2,
            ..BatchConfig::default()
        };
        let engine = engine(source, config);
        let mut sink = CollectingSink::new();

        let err = engine.run(&catalog(), T0, T0 + 20_000, &mut sink).unwrap_err();
        match err {
            EngineError::Fetch(FetchError::Fatal { tag_id, message }) => {
                assert_eq!(tag_id, "T2");
                assert_eq!(message, "lost license in window 2");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(window_indices(&sink), vec![Some(0), Some(1)]);
    }

    #[test]
    fn test_fatal_late_in_batch_emits_earlier_windows_of_that_batch() {
        let source = source().fail_window(
            "T1",
            T0 + 15_000,
            SourceError::fatal("lost license in window 3"),
        );
        let config = BatchConfig {
            window_batch: 2,
            ..BatchConfig::default()
        };
        let engine = engine(source, config);
        let mut sink = CollectingSink::new();

        let err = engine.run(&catalog(), T0, T0 + 20_000, &mut sink).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Fetch(FetchError::Fatal { ref tag_id, .. }) if tag_id == "T1"
        ));
        assert_eq!(window_indices(&sink), vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn test_invalid_range_rejected_before_fetch() {
        let engine = engine(source(), BatchConfig::default());
        let mut sink = CollectingSink::new();
        let err = engine.run(&catalog(), T0 + 1, T0, &mut sink).unwrap_err();
        assert!(matches!(err, EngineError::Plan(_)));
        assert!(engine.fetcher().source().calls().is_empty());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let engine = engine(source(), BatchConfig::default());
        let mut sink = CollectingSink::new();
        let err = engine
            .run(&TagCatalog::parse("# nothing\n"), T0, T0 + 1_000, &mut sink)
            .unwrap_err();
        assert!(matches!(err, EngineError::Catalog(CatalogError::Empty)));
    }

    #[test]
    fn test_config_from_extract_settings() {
        let extract = ExtractConfig {
            column_workers: 0,
            window_batch: 0,
            strategy: GridStrategy::Global,
            ..ExtractConfig::default()
        };
        let config = BatchConfig::from(&extract);
        assert!(config.column_workers >= 1);
        assert_eq!(config.window_batch, 1);
        assert_eq!(config.strategy, GridStrategy::Global);
    }
}
