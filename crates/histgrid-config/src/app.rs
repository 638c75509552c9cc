//! Application-wide configuration settings

use serde::{Deserialize, Serialize};

/// Application-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name for logging and identification
    pub name: String,

    /// Global log level, used when `RUST_LOG` is not set
    pub log_level: LogLevel,

    /// Enable debug mode with additional logging
    pub debug_mode: bool,
}

/// Log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "histgrid".to_string(),
            log_level: LogLevel::Info,
            debug_mode: false,
        }
    }
}

impl AppConfig {
    /// Check if running in debug mode
    pub fn is_debug(&self) -> bool {
        self.debug_mode || matches!(self.log_level, LogLevel::Debug | LogLevel::Trace)
    }

    /// Effective filter directive: debug mode raises the level to `debug`
    pub fn log_directive(&self) -> &'static str {
        if self.debug_mode && !self.is_trace() {
            LogLevel::Debug.as_directive()
        } else {
            self.log_level.as_directive()
        }
    }

    fn is_trace(&self) -> bool {
        self.log_level == LogLevel::Trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_mode_detection() {
        let mut config = AppConfig::default();
        assert!(!config.is_debug());
        assert_eq!(config.log_directive(), "info");

        config.debug_mode = true;
        assert!(config.is_debug());
        assert_eq!(config.log_directive(), "debug");

        config.debug_mode = false;
        config.log_level = LogLevel::Trace;
        assert!(config.is_debug());
        assert_eq!(config.log_directive(), "trace");
    }
}
