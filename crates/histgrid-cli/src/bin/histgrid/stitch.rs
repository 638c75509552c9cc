//! `histgrid stitch`

use anyhow::{Context, Result};
use clap::Args;
use histgrid_config::{MissingValue, Settings, TextEncoding};
use histgrid_io::{stitch_tables, StitchOptions};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct StitchArgs {
    /// Directory of extracted tables (searched recursively)
    #[arg(long)]
    input: PathBuf,

    /// Directory receiving `<name>/<name>.csv`
    #[arg(long)]
    output: PathBuf,

    /// Encoding of the input tables (default: export encoding)
    #[arg(long)]
    input_encoding: Option<TextEncoding>,

    /// Only read top-level folders starting with this prefix
    #[arg(long)]
    folder_prefix: Option<String>,

    /// Missing cell rendering: nan or empty (default: export setting)
    #[arg(long)]
    missing: Option<MissingValue>,
}

pub fn run(args: &StitchArgs, settings: &Settings) -> Result<()> {
    let options = StitchOptions {
        input_encoding: args.input_encoding.unwrap_or(settings.export.encoding),
        folder_prefix: args.folder_prefix.clone(),
        timestamp_pattern: settings.export.timestamp_pattern.clone(),
        missing: args.missing.unwrap_or(settings.export.missing_value),
    };

    let summary = stitch_tables(&args.input, &args.output, &options)
        .with_context(|| format!("failed to stitch tables under '{}'", args.input.display()))?;

    for variable in &summary.variables {
        println!("{}\t{}\t{}", variable.name, variable.rows, variable.path.display());
    }
    println!(
        "{} files read, {} skipped, {} variables written",
        summary.files_read,
        summary.files_skipped,
        summary.variables.len()
    );
    Ok(())
}
