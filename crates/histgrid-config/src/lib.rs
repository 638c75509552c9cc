//! Configuration management for histgrid
//!
//! Centralized configuration handling with support for:
//! - Default values
//! - Configuration files (TOML)
//! - Environment variables
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables (`HISTGRID_<SECTION>__<KEY>`, e.g. `HISTGRID_RETRY__MAX_ATTEMPTS=5`)
//! 3. Configuration file (`histgrid.toml`)
//! 4. Default values

mod app;
mod export;
mod extract;
mod retry;
mod source;

// Re-export main types
pub use app::{AppConfig, LogLevel};
pub use export::{ExportConfig, MissingValue, TextEncoding};
pub use extract::ExtractConfig;
pub use retry::RetryConfig;
pub use source::SourceConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure containing all configuration categories
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Application-wide settings
    pub app: AppConfig,

    /// Window planning, grid shape and concurrency
    pub extract: ExtractConfig,

    /// Fetch retry and backoff
    pub retry: RetryConfig,

    /// Output tables
    pub export: ExportConfig,

    /// Archive adapter selection
    pub source: SourceConfig,
}

impl Settings {
    /// Load configuration from multiple sources with proper precedence
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&Settings::default())?)
            // Add configuration file if it exists
            .add_source(
                config::File::with_name("histgrid")
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(environment());

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load configuration from a specific file path
    ///
    /// Environment variables still override the file.
    pub fn load_from_file(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(environment());

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Merge command-line arguments into the loaded configuration
    pub fn merge_cli_args(mut self, cli_args: &dyn CliConfigMerge) -> Self {
        cli_args.merge_into_config(&mut self);
        self
    }
}

/// `HISTGRID_` variables; `__` separates section from key so keys may contain `_`
fn environment() -> config::Environment {
    config::Environment::with_prefix("HISTGRID")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

/// Trait for merging CLI arguments into configuration
pub trait CliConfigMerge {
    fn merge_into_config(&self, config: &mut Settings);
}
