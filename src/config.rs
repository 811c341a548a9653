//! Configuration loading from environment variables.
//!
//! All configuration values are loaded from `PICO_*` environment variables
//! with sensible defaults. Invalid values fall back to defaults without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `PICO_CHECK_VERSION` | true | Reject datafiles from incompatible library versions |
//! | `PICO_VERBOSE` | false | Log successful version checks and load steps at info |
//! | `PICO_FACTORY_ENTRY` | get_pico | Entry point invoked when creating a datafile |
//! | `PICO_CONVERTED_SUFFIX` | _converted | Suffix for files written by `convert` |
//! | `PICO_LOG_LEVEL` | warn | Tracing filter directive |
//! | `PICO_LOG_FORMAT` | pretty | `pretty` or `json` |
//! | `PICO_LOG_FILE` | (stderr) | Write logs to this file instead |

use std::path::PathBuf;

use crate::models::DEFAULT_ENTRY_POINT;
use crate::telemetry::{LogConfig, LogFormat};

pub const DEFAULT_CONVERTED_SUFFIX: &str = "_converted";
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Effective configuration summary, as printed by `config show`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub check_version: bool,
    pub verbose: bool,
    pub factory_entry: String,
    pub converted_suffix: String,
    pub log_level: String,
    pub log_format: String,
    pub log_file: Option<String>,
}

/// All configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub check_version: bool,
    pub verbose: bool,
    pub factory_entry: String,
    pub converted_suffix: String,
    pub log: LogConfig,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            check_version: true,
            verbose: false,
            factory_entry: DEFAULT_ENTRY_POINT.to_string(),
            converted_suffix: DEFAULT_CONVERTED_SUFFIX.to_string(),
            log: LogConfig::default(),
        }
    }
}

/// Parse a boolean env var, returning `default` on missing or invalid.
fn parse_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Parse a non-empty string env var, returning `default` on missing or blank.
fn parse_string(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => val.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Load logging configuration from environment.
fn load_log_config() -> LogConfig {
    let level = parse_string("PICO_LOG_LEVEL", DEFAULT_LOG_LEVEL);
    let format = std::env::var("PICO_LOG_FORMAT")
        .ok()
        .and_then(|v| LogFormat::parse(&v))
        .unwrap_or_default();
    let output_path = std::env::var("PICO_LOG_FILE")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);
    LogConfig { format, level, output_path }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    EnvConfig {
        check_version: parse_bool("PICO_CHECK_VERSION", true),
        verbose: parse_bool("PICO_VERBOSE", false),
        factory_entry: parse_string("PICO_FACTORY_ENTRY", DEFAULT_ENTRY_POINT),
        converted_suffix: parse_string("PICO_CONVERTED_SUFFIX", DEFAULT_CONVERTED_SUFFIX),
        log: load_log_config(),
    }
}

impl EnvConfig {
    /// Return a printable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            check_version: self.check_version,
            verbose: self.verbose,
            factory_entry: self.factory_entry.clone(),
            converted_suffix: self.converted_suffix.clone(),
            log_level: self.log.level.clone(),
            log_format: self.log.format.as_str().to_string(),
            log_file: self
                .log
                .output_path
                .as_ref()
                .map(|p| p.display().to_string()),
        }
    }
}
