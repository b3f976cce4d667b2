//! Application configuration
//!
//! Stored as JSON in `~/.slot-studio/config.json`. Every field has a
//! default so a partial file is enough. `--config <path>` points at a
//! different file.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// YAML file holding the slot, vocabulary and slot-filling rules
    pub project_path: String,
    /// CSV or JSON-lines file of utterances to browse
    pub dataset_path: String,
    /// Rows fetched per page
    pub page_size: usize,
    /// Quiet period before the visible rows are reported
    pub visible_debounce_ms: u64,
    /// Rows past the visible window checked for loading
    pub loader_threshold: usize,
    /// Smallest range requested in one fetch
    pub loader_batch_size: usize,
    /// Blank lines between the pinned rows and the table body
    pub table_gutter: u16,
    /// Record fields shown as table columns, in order
    pub columns: Vec<String>,
    /// Event polling interval
    pub tick_rate_ms: u64,
    /// Capabilities granted to the current user, e.g. `stories:w`
    pub capabilities: Vec<String>,
    /// Directory for log files; defaults to the config directory
    pub log_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_path: "project.yml".to_string(),
            dataset_path: "utterances.csv".to_string(),
            page_size: 50,
            visible_debounce_ms: 500,
            loader_threshold: 15,
            loader_batch_size: 10,
            table_gutter: 0,
            columns: vec!["text".to_string(), "intent".to_string()],
            tick_rate_ms: 100,
            capabilities: vec!["stories:r".to_string(), "stories:w".to_string()],
            log_dir: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory (HOME is not set)")]
    NoConfigDir,
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        let home = env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".slot-studio"))
    }

    fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.json"))
    }

    /// Load from `--config <path>` or the default location
    ///
    /// A missing default file yields the default config.
    pub fn load() -> Result<Config, ConfigError> {
        if let Some(path) = config_path_from_args() {
            return Self::from_path(&path);
        }
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "project_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "page_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.loader_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "loader_batch_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.columns.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "columns",
                reason: "at least one column is required".to_string(),
            });
        }
        if self.tick_rate_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tick_rate_ms",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    /// Directory log files are written to
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .as_ref()
            .map(PathBuf::from)
            .or_else(Self::config_dir)
    }

    /// Save the config to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let config_dir = Self::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::default_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"dataset_path": "data/utts.jsonl", "page_size": 20}}"#).unwrap();

        let config = Config::from_path(file.path()).unwrap();
        assert_eq!(config.dataset_path, "data/utts.jsonl");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.visible_debounce_ms, 500);
        assert_eq!(config.project_path, "project.yml");
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = Config {
            page_size: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "page_size", .. })
        ));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            Config::from_path(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }
}
