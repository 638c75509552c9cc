//! `time,value` CSV records shared by the archive adapters

use csv::{ReaderBuilder, StringRecord, Trim};
use histgrid_core::{normalize_epoch, parse_wall_clock, parse_wall_clock_with, Sample};
use thiserror::Error;

/// Errors raised while parsing archive CSV output
#[derive(Debug, Error)]
pub enum RecordError {
    /// Malformed CSV structure
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// Time field matched neither the wall-clock pattern nor an epoch number
    #[error("Unparseable timestamp '{value}' on line {line}")]
    BadTimestamp { line: u64, value: String },

    /// Value field is neither a number nor an absent marker
    #[error("Unparseable value '{value}' on line {line}")]
    BadValue { line: u64, value: String },
}

/// Parse one value cell
///
/// `""`, `NaN`, `null` and `None` (any case) are absent values; anything else
/// must parse as `f64`.
pub fn parse_value_field(raw: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let s = raw.trim();
    if s.is_empty()
        || s.eq_ignore_ascii_case("nan")
        || s.eq_ignore_ascii_case("null")
        || s.eq_ignore_ascii_case("none")
    {
        return Ok(None);
    }
    let value = s.parse::<f64>()?;
    Ok(if value.is_nan() { None } else { Some(value) })
}

/// Parse one time cell: an epoch number (seconds or milliseconds) or wall-clock text
pub fn parse_time_field(raw: &str, pattern: Option<&str>) -> Option<i64> {
    let s = raw.trim();
    let digits = s.strip_prefix('-').unwrap_or(s);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse::<i64>().ok().map(normalize_epoch);
    }
    match pattern {
        Some(p) => parse_wall_clock_with(s, p).or_else(|_| parse_wall_clock(s)).ok(),
        None => parse_wall_clock(s).ok(),
    }
}

/// Detect a header row: the first field of the first line is not a timestamp
pub fn detect_csv_headers(buffer: &str, pattern: Option<&str>) -> bool {
    match buffer.lines().find(|l| !l.trim().is_empty()) {
        Some(first_line) => {
            let first_field = first_line.split(',').next().unwrap_or_default();
            let first_field = first_field.trim_start_matches('\u{feff}');
            parse_time_field(first_field, pattern).is_none()
        }
        None => false,
    }
}

/// Parse `time,value` CSV text into samples, in source order
///
/// A header row is auto-detected. A row with only a time field is an absent
/// sample.
pub fn parse_samples(buffer: &str, pattern: Option<&str>) -> Result<Vec<Sample>, RecordError> {
    let buffer = buffer.strip_prefix('\u{feff}').unwrap_or(buffer);
    let mut reader = ReaderBuilder::new()
        .has_headers(detect_csv_headers(buffer, pattern))
        .flexible(true)
        .trim(Trim::All)
        .from_reader(buffer.as_bytes());

    let mut samples = Vec::new();
    for result in reader.records() {
        let record = result?;
        samples.push(parse_record(&record, pattern)?);
    }
    Ok(samples)
}

fn parse_record(record: &StringRecord, pattern: Option<&str>) -> Result<Sample, RecordError> {
    let line = record.position().map(|p| p.line()).unwrap_or_default();
    let time = record.get(0).unwrap_or_default();
    let timestamp_ms =
        parse_time_field(time, pattern).ok_or_else(|| RecordError::BadTimestamp {
            line,
            value: time.to_string(),
        })?;

    let raw_value = record.get(1).unwrap_or_default();
    let value = parse_value_field(raw_value).map_err(|_| RecordError::BadValue {
        line,
        value: raw_value.to_string(),
    })?;

    Ok(Sample::new(timestamp_ms, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_751_328_000_000; // 2025-07-01 00:00:00

    #[test]
    fn test_parse_with_header() {
        let text = "time,value\n2025-07-01 00:00:00,1.5\n2025-07-01 00:00:01.250,2\n";
        let samples = parse_samples(text, None).unwrap();
        assert_eq!(
            samples,
            vec![Sample::new(T0, Some(1.5)), Sample::new(T0 + 1_250, Some(2.0))]
        );
    }

    #[test]
    fn test_parse_without_header_and_epochs() {
        let text = "1751328000,1\n1751328001000,2\n";
        let samples = parse_samples(text, None).unwrap();
        assert_eq!(samples[0].timestamp_ms, T0);
        assert_eq!(samples[1].timestamp_ms, T0 + 1_000);
    }

    #[test]
    fn test_absent_values() {
        let text = "time,value\n1751328000,\n1751328001,NaN\n1751328002,null\n1751328003,None\n1751328004\n";
        let samples = parse_samples(text, None).unwrap();
        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|s| s.value.is_none()));
    }

    #[test]
    fn test_bad_rows_are_errors() {
        assert!(matches!(
            parse_samples("time,value\nnot-a-time,1\n", None),
            Err(RecordError::BadTimestamp { line: 2, .. })
        ));
        assert!(matches!(
            parse_samples("time,value\n1751328000,abc\n", None),
            Err(RecordError::BadValue { line: 2, .. })
        ));
    }

    #[test]
    fn test_custom_pattern() {
        let samples = parse_samples("01/07/2025 00:00:05,3\n", Some("%d/%m/%Y %H:%M:%S")).unwrap();
        assert_eq!(samples, vec![Sample::new(T0 + 5_000, Some(3.0))]);
    }

    #[test]
    fn test_detect_headers() {
        assert!(detect_csv_headers("time,value\n", None));
        assert!(detect_csv_headers("\u{feff}timestamp,v\n", None));
        assert!(!detect_csv_headers("2025-07-01 00:00:00,1\n", None));
        assert!(!detect_csv_headers("", None));
    }

    #[test]
    fn test_value_field() {
        assert_eq!(parse_value_field(" 2.5 ").unwrap(), Some(2.5));
        assert_eq!(parse_value_field("NULL").unwrap(), None);
        assert!(parse_value_field("x").is_err());
    }
}
