//! Stitching per-window tables reproduces the run-wide per-tag table

use histgrid::batch::{BatchConfig, ExtractionEngine};
use histgrid::config::TextEncoding;
use histgrid::core::test_utils::{missing, sample, RecordingSleeper, ScriptedSource};
use histgrid::io::{stitch_tables, CsvTableWriter, StitchOptions, TableFormat};
use histgrid::{
    BoundaryPolicy, GridStrategy, RetryPolicy, RetryingFetcher, TagCatalog, WindowPlanner,
};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const T0: i64 = 1_751_328_000_000; // 2025-07-01 00:00:00

fn source() -> ScriptedSource {
    ScriptedSource::new()
        .with_series(
            "FT101",
            vec![
                sample(T0 + 200, 1.5),
                sample(T0 + 4_999, 2.0),
                sample(T0 + 5_000, 2.25),
                missing(T0 + 7_000),
                sample(T0 + 12_400, -3.0),
                sample(T0 + 12_900, 4.0),
                sample(T0 + 21_000, 5.0),
            ],
        )
        .with_series("TT01", vec![sample(T0 + 10_000, 80.5)])
}

fn extract(root: &Path, strategy: GridStrategy) {
    let fetcher = RetryingFetcher::new(source(), RetryPolicy::bounded(1))
        .with_sleeper(RecordingSleeper::default());
    let planner = WindowPlanner::new(Duration::from_secs(5), BoundaryPolicy::Closed).unwrap();
    let config = BatchConfig {
        strategy,
        ..BatchConfig::default()
    };
    let engine = ExtractionEngine::new(fetcher, planner, config).unwrap();
    let format = TableFormat::default().with_encoding(TextEncoding::Utf8);
    let mut writer = CsvTableWriter::new(root, "export", format);
    let catalog = TagCatalog::parse("Flow,FT101\nTemp,TT01\n");
    engine.run(&catalog, T0, T0 + 22_000, &mut writer).unwrap();
}

#[test]
fn test_stitched_windows_match_global_table() {
    let tmp = TempDir::new().unwrap();
    let per_window = tmp.path().join("per_window");
    let global = tmp.path().join("global");
    let stitched = tmp.path().join("stitched");

    extract(&per_window, GridStrategy::PerWindow);
    extract(&global, GridStrategy::Global);

    let options = StitchOptions {
        input_encoding: TextEncoding::Utf8,
        ..StitchOptions::default()
    };
    let summary = stitch_tables(&per_window, &stitched, &options).unwrap();
    // [0,5] [5,10] [10,15] [15,20] [20,22] for two tags
    assert_eq!(summary.files_read, 10);
    assert_eq!(summary.variables.len(), 2);

    for name in ["Flow", "Temp"] {
        let joined = fs::read_to_string(stitched.join(name).join(format!("{name}.csv"))).unwrap();
        let whole = fs::read_to_string(
            global
                .join(name)
                .join(format!("{name}_20250701T000000-20250701T000022.csv")),
        )
        .unwrap();
        assert_eq!(joined, whole, "{name}");
    }

    let flow = fs::read_to_string(stitched.join("Flow").join("Flow.csv")).unwrap();
    let lines: Vec<_> = flow.lines().collect();
    assert_eq!(lines.len(), 24);
    assert_eq!(lines[1], "2025-07-01 00:00:00,1.5");
    assert_eq!(lines[5], "2025-07-01 00:00:04,2");
    assert_eq!(lines[6], "2025-07-01 00:00:05,2.25");
    assert_eq!(lines[8], "2025-07-01 00:00:07,NaN");
    assert_eq!(lines[13], "2025-07-01 00:00:12,4");
}
