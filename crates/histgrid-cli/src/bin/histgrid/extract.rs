//! `histgrid extract`

use anyhow::{bail, Context, Result};
use clap::Args;
use histgrid_batch::{BatchConfig, ExtractionEngine};
use histgrid_config::{CliConfigMerge, MissingValue, Settings, SourceConfig, TextEncoding};
use histgrid_core::{
    parse_wall_clock, parse_wall_clock_with, ArchiveSource, BoundaryPolicy, GridStrategy,
    RetryingFetcher, TableLayout, TagCatalog,
};
use histgrid_io::CsvTableWriter;
use histgrid_providers::{CommandArchive, CsvArchive};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Range start, e.g. "2025-07-01 00:00:00"
    #[arg(long)]
    start: String,

    /// Range end
    #[arg(long)]
    end: String,

    /// Tag catalog, one `display name,tag id` per line
    #[arg(long)]
    tags: PathBuf,

    /// File label for wide tables
    #[arg(long)]
    prefix: Option<String>,

    /// Window length in minutes
    #[arg(long)]
    step_minutes: Option<u64>,

    /// Replay archive directory holding `<tag>.csv` files
    #[arg(long, conflicts_with = "archive_cmd")]
    archive_dir: Option<PathBuf>,

    /// External archive client, run as `<cmd> [args…] <tag> <start> <end>`
    #[arg(long)]
    archive_cmd: Option<String>,

    /// Leading argument for the archive client (repeatable)
    #[arg(long = "archive-arg", requires = "archive_cmd")]
    archive_args: Vec<String>,

    /// per_tag or wide
    #[arg(long)]
    layout: Option<TableLayout>,

    /// per_window or global
    #[arg(long)]
    strategy: Option<GridStrategy>,

    /// Range end handling: right_open or closed
    #[arg(long)]
    policy: Option<BoundaryPolicy>,

    /// Give up on a column after this many attempts (default: retry forever)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Give up on a column after this many seconds of retrying
    #[arg(long)]
    max_elapsed_secs: Option<u64>,

    /// Missing cell rendering: nan or empty
    #[arg(long)]
    missing: Option<MissingValue>,

    /// Output encoding: utf-8 or gbk
    #[arg(long)]
    encoding: Option<TextEncoding>,

    /// Output root directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Columns fetched concurrently (0 = one per CPU)
    #[arg(long)]
    column_workers: Option<usize>,

    /// Windows assembled concurrently
    #[arg(long)]
    window_batch: Option<usize>,
}

impl CliConfigMerge for ExtractArgs {
    fn merge_into_config(&self, config: &mut Settings) {
        if let Some(prefix) = &self.prefix {
            config.export.prefix = prefix.clone();
        }
        if let Some(step) = self.step_minutes {
            config.extract.step_minutes = step;
        }
        if let Some(dir) = &self.archive_dir {
            config.source.archive_dir = Some(dir.clone());
            config.source.command = None;
        }
        if let Some(cmd) = &self.archive_cmd {
            config.source.command = Some(cmd.clone());
            config.source.command_args = self.archive_args.clone();
        }
        if let Some(layout) = self.layout {
            config.extract.layout = layout;
        }
        if let Some(strategy) = self.strategy {
            config.extract.strategy = strategy;
        }
        if let Some(policy) = self.policy {
            config.extract.boundary_policy = policy;
        }
        if let Some(attempts) = self.max_attempts {
            config.retry.max_attempts = Some(attempts);
        }
        if let Some(secs) = self.max_elapsed_secs {
            config.retry.max_elapsed_secs = Some(secs);
        }
        if let Some(missing) = self.missing {
            config.export.missing_value = missing;
        }
        if let Some(encoding) = self.encoding {
            config.export.encoding = encoding;
        }
        if let Some(dir) = &self.output_dir {
            config.export.output_dir = dir.clone();
        }
        if let Some(workers) = self.column_workers {
            config.extract.column_workers = workers;
        }
        if let Some(batch) = self.window_batch {
            config.extract.window_batch = batch;
        }
    }
}

pub fn run(args: &ExtractArgs, settings: &Settings) -> Result<()> {
    let pattern = &settings.extract.timestamp_pattern;
    let start_ms = parse_instant(&args.start, pattern).context("invalid --start")?;
    let end_ms = parse_instant(&args.end, pattern).context("invalid --end")?;

    let catalog = TagCatalog::load(&args.tags)
        .and_then(TagCatalog::non_empty)
        .with_context(|| format!("cannot use tag catalog '{}'", args.tags.display()))?;

    let source = build_source(&settings.source, settings.retry.is_bounded())?;
    let fetcher = RetryingFetcher::new(source, settings.retry.to_policy());
    let planner = settings.extract.planner()?;
    let engine = ExtractionEngine::new(fetcher, planner, BatchConfig::from(&settings.extract))?;
    let mut writer = CsvTableWriter::from_config(&settings.export);

    let summary = engine.run(&catalog, start_ms, end_ms, &mut writer)?;

    info!(
        event_type = "extract_complete",
        windows = summary.windows,
        tables = writer.written().len(),
        rows = summary.rows_emitted,
        attempts = summary.metrics.attempts,
        give_ups = summary.metrics.give_ups,
        output_dir = %writer.root().display(),
        "All windows extracted"
    );
    Ok(())
}

fn parse_instant(text: &str, pattern: &str) -> Result<i64> {
    parse_wall_clock_with(text, pattern)
        .or_else(|_| parse_wall_clock(text))
        .with_context(|| format!("'{text}' does not match '{pattern}'"))
}

fn build_source(config: &SourceConfig, bounded_retry: bool) -> Result<Box<dyn ArchiveSource>> {
    if let Some(program) = &config.command {
        let mut archive = CommandArchive::new(program.as_str())
            .with_args(config.command_args.iter().cloned())
            .with_fatal_exit_code(config.fatal_exit_code);
        if let Some(pattern) = &config.timestamp_pattern {
            archive = archive.with_timestamp_pattern(pattern.as_str());
        }
        info!(
            event_type = "source_selected",
            source = "command",
            program = %program,
            "Using external archive client"
        );
        return Ok(Box::new(archive));
    }

    if let Some(dir) = &config.archive_dir {
        let mut archive = CsvArchive::new(dir);
        if let Some(pattern) = &config.timestamp_pattern {
            archive = archive.with_timestamp_pattern(pattern.as_str());
        }
        if !bounded_retry {
            warn!(
                event_type = "unbounded_replay",
                archive_dir = %dir.display(),
                "Tags without a replay file retry forever; set --max-attempts to bound them"
            );
        }
        info!(
            event_type = "source_selected",
            source = "csv-archive",
            archive_dir = %dir.display(),
            "Using replay archive directory"
        );
        return Ok(Box::new(archive));
    }

    bail!("no archive configured: pass --archive-dir or --archive-cmd, or set [source] in histgrid.toml")
}
