//! Output file and directory naming

use histgrid_core::{format_millis, TimeWindow, FILE_STAMP_PATTERN};

const FORBIDDEN_IN_FOLDER: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Directory name for a display name
///
/// Runs of `<>:"/\|?*` become a single `_`, surrounding whitespace and
/// trailing dots or spaces are removed, and an empty result becomes `_`.
///
/// ```rust
/// use histgrid_io::sanitize_folder_name;
///
/// assert_eq!(sanitize_folder_name("Flow: A/B"), "Flow_ A_B");
/// assert_eq!(sanitize_folder_name(" ..."), "_");
/// ```
pub fn sanitize_folder_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if FORBIDDEN_IN_FOLDER.contains(&c) {
            if !in_run {
                out.push('_');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    let trimmed = out.trim().trim_end_matches(['.', ' ']);
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Directory and file stem for a stitched variable
///
/// Keeps alphanumerics and `- _ . #` plus spaces; anything else becomes `_`.
pub fn sanitize_variable_name(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.' | '#') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let safe = safe.trim();
    if safe.is_empty() {
        "unnamed_variable".to_string()
    } else {
        safe.to_string()
    }
}

/// `<label>_<YYYYmmddTHHMMSS>-<YYYYmmddTHHMMSS>.csv`
pub fn table_file_name(label: &str, span: &TimeWindow) -> String {
    format!(
        "{label}_{}-{}.csv",
        format_millis(span.start_ms, FILE_STAMP_PATTERN),
        format_millis(span.end_ms, FILE_STAMP_PATTERN)
    )
}
