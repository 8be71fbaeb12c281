//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Directory name used under the user's config directory
pub const APP_DIR_NAME: &str = "hyuga";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory holding `projects/` (local backend only)
    pub data_dir: PathBuf,

    /// Backend provider (local, mock)
    pub backend_provider: String,

    /// Runtime configuration
    pub log_level: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

/// Output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!(
                "Unknown LOG_FORMAT: {}. Supported formats: pretty, json",
                other
            )),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let data_dir = match env::var("HYUGA_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_data_dir()?,
        };

        let log_format = match env::var("LOG_FORMAT") {
            Ok(value) => value.parse()?,
            Err(_) => LogFormat::default(),
        };

        let config = Self {
            data_dir,
            backend_provider: env::var("BACKEND_PROVIDER").unwrap_or_else(|_| "local".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "hyuga=debug".to_string()),
            log_format,
        };

        Ok(config)
    }
}

/// `$XDG_CONFIG_HOME/hyuga`, falling back to `$HOME/.config/hyuga`
fn default_data_dir() -> Result<PathBuf> {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        if !xdg.trim().is_empty() {
            return Ok(PathBuf::from(xdg).join(APP_DIR_NAME));
        }
    }

    let home = env::var("HOME").map_err(|_| {
        anyhow::anyhow!("HYUGA_DATA_DIR is required when neither XDG_CONFIG_HOME nor HOME is set")
    })?;
    Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "HYUGA_DATA_DIR",
            "BACKEND_PROVIDER",
            "LOG_LEVEL",
            "RUST_LOG",
            "LOG_FORMAT",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_config_explicit_data_dir() {
        clear_env();
        env::set_var("HYUGA_DATA_DIR", "/tmp/hyuga-test");
        env::set_var("BACKEND_PROVIDER", "mock");

        let config = Config::from_env().unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/hyuga-test"));
        assert_eq!(config.backend_provider, "mock");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env();
        env::set_var("HYUGA_DATA_DIR", "/tmp/hyuga-defaults");

        let config = Config::from_env().unwrap();
        assert_eq!(config.backend_provider, "local");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.rust_log, "hyuga=debug");
        assert_eq!(config.log_format, LogFormat::Pretty);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_rejects_unknown_log_format() {
        clear_env();
        env::set_var("HYUGA_DATA_DIR", "/tmp/hyuga-format");
        env::set_var("LOG_FORMAT", "xml");

        assert!(Config::from_env().is_err());
        clear_env();
    }

    #[test]
    fn test_log_format_parse_is_case_insensitive() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
    }
}
