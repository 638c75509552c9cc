//! histgrid - historian tag extraction
//!
//! Pulls archived samples for a catalog of tags, resamples them onto a
//! per-second grid and writes CSV tables. Also stitches per-window tables into
//! per-variable tables and reports column coverage of existing tables.

mod coverage;
mod extract;
mod stitch;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use histgrid_config::{CliConfigMerge, Settings};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "histgrid",
    about = "Extract historian tags onto a per-second grid",
    long_about = "
Extracts archived samples for every tag in a catalog file, one bounded window at
a time, and writes dense per-second CSV tables.

Configuration is read from histgrid.toml (or --config), then HISTGRID_*
environment variables (e.g. HISTGRID_RETRY__MAX_ATTEMPTS=5), then flags.

Examples:
  histgrid extract --start '2025-07-01 00:00:00' --end '2025-07-02 00:00:00' \\
      --tags tags.txt --archive-dir ./archive
  histgrid stitch --input variables_out --output stitched
  histgrid coverage stitched/FT101/FT101.csv --json
",
    version
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract tags from the archive into per-second tables
    Extract(extract::ExtractArgs),

    /// Join per-window tables into one table per variable
    Stitch(stitch::StitchArgs),

    /// Report non-missing counts and latest timestamps per column
    Coverage(coverage::CoverageArgs),
}

impl CliConfigMerge for Cli {
    fn merge_into_config(&self, config: &mut Settings) {
        if self.verbose {
            config.app.debug_mode = true;
        }
        if let Command::Extract(args) = &self.command {
            args.merge_into_config(config);
        }
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("failed to load configuration from '{}'", path.display()))?,
        None => Settings::load().context("failed to load configuration")?,
    };
    Ok(settings.merge_cli_args(cli))
}

fn init_tracing(settings: &Settings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("histgrid={}", settings.app.log_directive()))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(settings.app.is_debug())
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    init_tracing(&settings);

    debug!(
        event_type = "settings_loaded",
        step_minutes = settings.extract.step_minutes,
        output_dir = %settings.export.output_dir.display(),
        "Configuration loaded"
    );

    match &cli.command {
        Command::Extract(args) => extract::run(args, &settings),
        Command::Stitch(args) => stitch::run(args, &settings),
        Command::Coverage(args) => coverage::run(args, &settings),
    }
}
