//! CSV table rendering and encoding

use crate::errors::TableError;
use histgrid_config::{ExportConfig, MissingValue, TextEncoding};
use histgrid_core::{format_seconds, is_missing, Grid, DEFAULT_TIMESTAMP_PATTERN};
use std::path::Path;
use tracing::warn;

/// How a grid is rendered to text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFormat {
    pub missing: MissingValue,
    pub encoding: TextEncoding,

    /// chrono pattern for the `time` column
    pub timestamp_pattern: String,
}

impl Default for TableFormat {
    fn default() -> Self {
        Self {
            missing: MissingValue::Nan,
            encoding: TextEncoding::Gbk,
            timestamp_pattern: DEFAULT_TIMESTAMP_PATTERN.to_string(),
        }
    }
}

impl From<&ExportConfig> for TableFormat {
    fn from(config: &ExportConfig) -> Self {
        Self {
            missing: config.missing_value,
            encoding: config.encoding,
            timestamp_pattern: config.timestamp_pattern.clone(),
        }
    }
}

impl TableFormat {
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_missing(mut self, missing: MissingValue) -> Self {
        self.missing = missing;
        self
    }

    /// Render one cell
    ///
    /// Values use the shortest text that parses back to the same `f64`, so a
    /// whole number has no fractional part: `2.0` is written as `2`, not the
    /// `2.0` a Java historian export would show. Readers parse both forms.
    pub fn format_value(&self, value: f64) -> String {
        if is_missing(value) {
            self.missing.render().to_string()
        } else {
            value.to_string()
        }
    }
}

/// Render `time,<col1>,…` CSV text, rows ascending
pub fn render_table(grid: &Grid, format: &TableFormat) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::with_capacity(grid.len() * 32));

    let mut header = Vec::with_capacity(grid.width() + 1);
    header.push("time");
    header.extend(grid.columns().iter().map(|c| c.display_name.as_str()));
    writer.write_record(&header)?;

    let mut record = Vec::with_capacity(grid.width() + 1);
    for (second, row) in grid.rows() {
        record.clear();
        record.push(format_seconds(second, &format.timestamp_pattern));
        record.extend(row.iter().map(|v| format.format_value(*v)));
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    // csv only writes the UTF-8 strings it was given
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Encode text for output
///
/// Characters GBK cannot represent are replaced by numeric character
/// references; the second value reports whether that happened.
pub fn encode_text(text: &str, encoding: TextEncoding) -> (Vec<u8>, bool) {
    match encoding {
        TextEncoding::Utf8 => (text.as_bytes().to_vec(), false),
        TextEncoding::Gbk => {
            let (bytes, _, had_unmappable) = encoding_rs::GBK.encode(text);
            (bytes.into_owned(), had_unmappable)
        }
    }
}

/// Decode table bytes, honouring a byte-order mark when present
pub fn decode_text(bytes: &[u8], encoding: TextEncoding) -> Option<String> {
    let codec = match encoding {
        TextEncoding::Utf8 => encoding_rs::UTF_8,
        TextEncoding::Gbk => encoding_rs::GBK,
    };
    let (text, _, had_errors) = codec.decode(bytes);
    if had_errors {
        None
    } else {
        Some(text.into_owned())
    }
}

/// Render and write a grid, creating parent directories; returns rows written
pub fn write_table(grid: &Grid, path: &Path, format: &TableFormat) -> Result<usize, TableError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| TableError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let text = render_table(grid, format).map_err(|source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let (bytes, had_unmappable) = encode_text(&text, format.encoding);
    if had_unmappable {
        warn!(
            event_type = "table_unmappable_chars",
            path = %path.display(),
            encoding = format.encoding.label(),
            "Some characters could not be represented and were escaped"
        );
    }

    std::fs::write(path, bytes).map_err(|source| TableError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(grid.len())
}
