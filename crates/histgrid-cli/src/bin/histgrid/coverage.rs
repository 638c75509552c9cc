//! `histgrid coverage`

use anyhow::{Context, Result};
use clap::Args;
use histgrid_config::{Settings, TextEncoding};
use histgrid_io::{reports_to_json, CoverageReport};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct CoverageArgs {
    /// Tables to inspect
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Encoding of the tables (default: export encoding)
    #[arg(long)]
    encoding: Option<TextEncoding>,
}

pub fn run(args: &CoverageArgs, settings: &Settings) -> Result<()> {
    let encoding = args.encoding.unwrap_or(settings.export.encoding);
    let pattern = &settings.export.timestamp_pattern;

    let reports = args
        .files
        .iter()
        .map(|path| {
            CoverageReport::from_file(path, encoding, pattern)
                .with_context(|| format!("cannot read '{}'", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    if args.json {
        println!("{}", reports_to_json(&reports)?);
    } else {
        for report in &reports {
            print!("{}", report.render_text());
        }
    }
    Ok(())
}
