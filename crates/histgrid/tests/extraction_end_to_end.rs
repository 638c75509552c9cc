//! End-to-end extraction: catalog file + replay archive → CSV tables on disk

use histgrid::batch::{BatchConfig, ExtractionEngine};
use histgrid::config::{MissingValue, Settings, TextEncoding};
use histgrid::core::parse_wall_clock;
use histgrid::io::{decode_text, CsvTableWriter, TableFormat};
use histgrid::providers::CsvArchive;
use histgrid::{GridStrategy, RetryPolicy, RetryingFetcher, TableLayout, TagCatalog};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn ms(text: &str) -> i64 {
    parse_wall_clock(text).unwrap()
}

fn write_archive(dir: &Path, tag: &str, body: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("{tag}.csv")), body).unwrap();
}

fn utf8() -> TableFormat {
    TableFormat::default().with_encoding(TextEncoding::Utf8)
}

#[test]
fn test_single_tag_two_row_table() {
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("archive");
    write_archive(&archive, "T1", "time,value\n2025-07-01 00:00:00.200,3.5\n");
    let catalog_path = tmp.path().join("tags.txt");
    fs::write(&catalog_path, "A,T1\n").unwrap();

    let catalog = TagCatalog::load(&catalog_path).unwrap().non_empty().unwrap();
    let fetcher = RetryingFetcher::new(CsvArchive::new(&archive), RetryPolicy::bounded(3));
    let planner = Settings::default().extract.planner().unwrap();
    let engine = ExtractionEngine::new(fetcher, planner, BatchConfig::default()).unwrap();
    let mut writer = CsvTableWriter::new(tmp.path().join("out"), "export", utf8());

    // Right-open: the requested end second is excluded
    let summary = engine
        .run(
            &catalog,
            ms("2025-07-01 00:00:00"),
            ms("2025-07-01 00:00:02"),
            &mut writer,
        )
        .unwrap();
    assert_eq!(summary.windows, 1);
    assert_eq!(summary.rows_emitted, 2);

    let path = tmp
        .path()
        .join("out")
        .join("A")
        .join("A_20250701T000000-20250701T000001.csv");
    assert_eq!(writer.written()[0].path, path);
    assert_eq!(
        fs::read_to_string(path).unwrap(),
        "time,A\n2025-07-01 00:00:00,3.5\n2025-07-01 00:00:01,NaN\n"
    );
}

#[test]
fn test_duplicate_tag_ids_keep_first_display_name() {
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("archive");
    write_archive(&archive, "tag1", "2025-07-01 00:00:00,1\n");
    write_archive(&archive, "tag2", "2025-07-01 00:00:00,2\n");

    let catalog = TagCatalog::parse("A,tag1\nB,tag1\n#x,y\nA,tag2\n");
    let ids: Vec<_> = catalog.columns().iter().map(|c| c.tag_id.as_str()).collect();
    assert_eq!(ids, ["tag1", "tag2"]);

    let fetcher = RetryingFetcher::new(CsvArchive::new(&archive), RetryPolicy::bounded(1));
    let planner = Settings::default().extract.planner().unwrap();
    let config = BatchConfig {
        layout: TableLayout::Wide,
        ..BatchConfig::default()
    };
    let engine = ExtractionEngine::new(fetcher, planner, config).unwrap();
    let mut writer = CsvTableWriter::new(tmp.path().join("out"), "plant", utf8());

    let start = ms("2025-07-01 00:00:00");
    engine.run(&catalog, start, start, &mut writer).unwrap();

    let text = fs::read_to_string(&writer.written()[0].path).unwrap();
    assert_eq!(text, "time,A,A\n2025-07-01 00:00:00,1,2\n");
}

#[test]
fn test_settings_file_drives_run() {
    let tmp = TempDir::new().unwrap();
    let archive = tmp.path().join("archive");
    write_archive(
        &archive,
        "FT101",
        "time,value\n2025-07-01 00:00:30,1.5\n2025-07-01 00:01:30,2.5\n",
    );

    let mut config_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        config_file,
        r#"
[extract]
step_minutes = 1
strategy = "global"
layout = "wide"

[retry]
max_attempts = 2

[export]
output_dir = "{}"
prefix = "unit 1"
missing_value = "empty"
encoding = "gbk"
"#,
        tmp.path().join("out").display()
    )
    .unwrap();
    let settings = Settings::load_from_file(config_file.path()).unwrap();
    assert_eq!(settings.export.missing_value, MissingValue::Empty);

    let catalog = TagCatalog::parse("流量,FT101\n");
    let fetcher = RetryingFetcher::new(CsvArchive::new(&archive), settings.retry.to_policy());
    let engine = ExtractionEngine::new(
        fetcher,
        settings.extract.planner().unwrap(),
        BatchConfig::from(&settings.extract),
    )
    .unwrap();
    assert_eq!(engine.config().strategy, GridStrategy::Global);
    let mut writer = CsvTableWriter::from_config(&settings.export);

    let summary = engine
        .run(
            &catalog,
            ms("2025-07-01 00:00:00"),
            ms("2025-07-01 00:02:00"),
            &mut writer,
        )
        .unwrap();
    assert_eq!(summary.windows, 2);
    assert_eq!(summary.emissions, 1);
    assert_eq!(summary.rows_emitted, 120);

    let path = tmp
        .path()
        .join("out")
        .join("unit 1_20250701T000000-20250701T000159.csv");
    let text = decode_text(&fs::read(path).unwrap(), TextEncoding::Gbk).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "time,流量");
    assert_eq!(lines[1], "2025-07-01 00:00:00,");
    assert_eq!(lines[31], "2025-07-01 00:00:30,1.5");
    assert_eq!(lines[91], "2025-07-01 00:01:30,2.5");
    assert_eq!(lines.len(), 121);
}

#[test]
fn test_missing_archive_directory_aborts() {
    let tmp = TempDir::new().unwrap();
    let fetcher = RetryingFetcher::new(
        CsvArchive::new(tmp.path().join("absent")),
        RetryPolicy::unbounded(),
    );
    let planner = Settings::default().extract.planner().unwrap();
    let engine = ExtractionEngine::new(fetcher, planner, BatchConfig::default()).unwrap();
    let mut writer = CsvTableWriter::new(tmp.path().join("out"), "export", utf8());

    let start = ms("2025-07-01 00:00:00");
    let err = engine
        .run(&TagCatalog::parse("A,T1\n"), start, start + 5_000, &mut writer)
        .unwrap_err();
    assert!(matches!(err, histgrid::EngineError::Fetch(_)));
    assert!(writer.written().is_empty());
    assert!(!tmp.path().join("out").exists());
}
