//! Export and output configuration

use histgrid_core::DEFAULT_TIMESTAMP_PATTERN;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Export and output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Root directory for extracted tables
    pub output_dir: PathBuf,

    /// File label for wide tables (per-tag tables use the display name)
    pub prefix: String,

    /// How missing cells are written
    pub missing_value: MissingValue,

    /// Text encoding of extracted tables
    pub encoding: TextEncoding,

    /// chrono pattern for the `time` column
    pub timestamp_pattern: String,
}

/// Rendering of a missing cell
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MissingValue {
    /// Literal `NaN`
    #[default]
    Nan,
    /// Empty field
    Empty,
}

/// Output text encodings
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    Utf8,
    /// Simplified Chinese GBK, the historian workstation default
    #[default]
    Gbk,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("variables_out"),
            prefix: "export".to_string(),
            missing_value: MissingValue::Nan,
            encoding: TextEncoding::Gbk,
            timestamp_pattern: DEFAULT_TIMESTAMP_PATTERN.to_string(),
        }
    }
}

impl MissingValue {
    /// Text written for a missing cell
    pub fn render(&self) -> &'static str {
        match self {
            MissingValue::Nan => "NaN",
            MissingValue::Empty => "",
        }
    }
}

impl FromStr for MissingValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nan" => Ok(MissingValue::Nan),
            "empty" | "blank" => Ok(MissingValue::Empty),
            other => Err(format!("unknown missing-value style '{other}' (expected nan or empty)")),
        }
    }
}

impl TextEncoding {
    /// WHATWG label, as understood by `encoding_rs::Encoding::for_label`
    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Gbk => "gbk",
        }
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "utf8" => Ok(TextEncoding::Utf8),
            "gbk" | "gb2312" | "cp936" => Ok(TextEncoding::Gbk),
            other => Err(format!("unsupported encoding '{other}' (expected utf-8 or gbk)")),
        }
    }
}
