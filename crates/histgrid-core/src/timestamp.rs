//! Wall-clock timestamp utilities
//!
//! Archive instants are carried as epoch milliseconds on the archive's own wall
//! clock: a `yyyy-MM-dd HH:mm:ss` string is interpreted without any timezone
//! shift, and formatting reverses that exactly. Grid rows are keyed by whole
//! epoch seconds.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Pattern used for command-line instants and output table rows
pub const DEFAULT_TIMESTAMP_PATTERN: &str = "%Y-%m-%d %H:%M:%S";

/// Pattern used inside output file names (`20250701T000000`)
pub const FILE_STAMP_PATTERN: &str = "%Y%m%dT%H%M%S";

pub const MILLIS_PER_SECOND: i64 = 1_000;

/// Raw epoch values below this are seconds; at or above it, milliseconds
const MILLISECOND_THRESHOLD: i64 = 100_000_000_000;

/// Accepted wall-clock layouts, tried in order
const WALL_CLOCK_PATTERNS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

/// Truncate an epoch-millisecond instant to its whole second
///
/// Rounds toward negative infinity so that pre-epoch instants land on the
/// second that contains them.
///
/// ```rust
/// use histgrid_core::floor_to_second;
///
/// assert_eq!(floor_to_second(1_751_328_000_999), 1_751_328_000);
/// assert_eq!(floor_to_second(-1), -1);
/// ```
pub fn floor_to_second(timestamp_ms: i64) -> i64 {
    timestamp_ms.div_euclid(MILLIS_PER_SECOND)
}

/// Parse a wall-clock instant into epoch milliseconds
///
/// Accepts `2025-07-01 00:00:00`, an ISO `T` separator, or slashes, each with an
/// optional fractional second.
pub fn parse_wall_clock(text: &str) -> Result<i64, chrono::ParseError> {
    let trimmed = text.trim();
    let mut last_error = None;
    for pattern in WALL_CLOCK_PATTERNS {
        match parse_wall_clock_with(trimmed, pattern) {
            Ok(ms) => return Ok(ms),
            Err(e) => last_error = Some(e),
        }
    }
    // WALL_CLOCK_PATTERNS is non-empty, so at least one error was recorded
    match last_error {
        Some(e) => Err(e),
        None => parse_wall_clock_with(trimmed, DEFAULT_TIMESTAMP_PATTERN),
    }
}

/// Parse a wall-clock instant with an explicit chrono pattern
pub fn parse_wall_clock_with(text: &str, pattern: &str) -> Result<i64, chrono::ParseError> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), pattern)?;
    Ok(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).timestamp_millis())
}

/// Normalize a raw numeric epoch to milliseconds
///
/// 10-digit values are seconds, 13-digit values are already milliseconds.
pub fn normalize_epoch(raw: i64) -> i64 {
    if raw.abs() < MILLISECOND_THRESHOLD {
        raw.saturating_mul(MILLIS_PER_SECOND)
    } else {
        raw
    }
}

/// Format epoch milliseconds as wall-clock text
///
/// Instants outside chrono's range fall back to the raw number.
pub fn format_millis(timestamp_ms: i64, pattern: &str) -> String {
    match DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
        Some(dt) => dt.naive_utc().format(pattern).to_string(),
        None => timestamp_ms.to_string(),
    }
}

/// Format a whole epoch second as wall-clock text
pub fn format_seconds(seconds: i64, pattern: &str) -> String {
    match DateTime::<Utc>::from_timestamp(seconds, 0) {
        Some(dt) => dt.naive_utc().format(pattern).to_string(),
        None => seconds.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2025-07-01 00:00:00 on the archive wall clock
    const JULY_FIRST_MS: i64 = 1_751_328_000_000;

    #[test]
    fn test_parse_default_pattern() {
        assert_eq!(parse_wall_clock("2025-07-01 00:00:00").unwrap(), JULY_FIRST_MS);
        assert_eq!(
            parse_wall_clock("  2025-07-01 00:00:01 ").unwrap(),
            JULY_FIRST_MS + 1_000
        );
    }

    #[test]
    fn test_parse_fraction_and_iso_separator() {
        assert_eq!(
            parse_wall_clock("2025-07-01 00:00:00.250").unwrap(),
            JULY_FIRST_MS + 250
        );
        assert_eq!(parse_wall_clock("2025-07-01T00:00:00").unwrap(), JULY_FIRST_MS);
        assert_eq!(parse_wall_clock("2025/07/01 00:00:00").unwrap(), JULY_FIRST_MS);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_wall_clock("yesterday").is_err());
        assert!(parse_wall_clock("2025-07-01").is_err());
    }

    #[test]
    fn test_floor_to_second() {
        assert_eq!(floor_to_second(JULY_FIRST_MS), 1_751_328_000);
        assert_eq!(floor_to_second(JULY_FIRST_MS + 999), 1_751_328_000);
        assert_eq!(floor_to_second(JULY_FIRST_MS + 1_000), 1_751_328_001);
        // Pre-epoch instants round down, not toward zero
        assert_eq!(floor_to_second(-1), -1);
        assert_eq!(floor_to_second(-1_000), -1);
        assert_eq!(floor_to_second(-1_001), -2);
    }

    #[test]
    fn test_format_round_trip() {
        assert_eq!(
            format_millis(JULY_FIRST_MS, DEFAULT_TIMESTAMP_PATTERN),
            "2025-07-01 00:00:00"
        );
        assert_eq!(
            format_seconds(1_751_328_061, DEFAULT_TIMESTAMP_PATTERN),
            "2025-07-01 00:01:01"
        );
        assert_eq!(
            format_millis(JULY_FIRST_MS + 600_000, FILE_STAMP_PATTERN),
            "20250701T001000"
        );
    }

    #[test]
    fn test_normalize_epoch() {
        assert_eq!(normalize_epoch(1_751_328_000), JULY_FIRST_MS);
        assert_eq!(normalize_epoch(JULY_FIRST_MS), JULY_FIRST_MS);
    }
}
