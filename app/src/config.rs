//! FILENAME: app/src/config.rs
// PURPOSE: Dashboard configuration (JSON file + environment overrides).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pivot_engine::DEFAULT_PER_PAGE;
use report_export::DEFAULT_REPORT_PREFIX;

pub const ENV_API_URL: &str = "REGSTATS_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "REGSTATS_TIMEOUT_SECS";
pub const ENV_PER_PAGE: &str = "REGSTATS_PER_PAGE";
pub const ENV_REPORT_PREFIX: &str = "REGSTATS_REPORT_PREFIX";
pub const ENV_OUTPUT_DIR: &str = "REGSTATS_OUTPUT_DIR";
pub const ENV_LOG_LEVEL: &str = "REGSTATS_LOG";
pub const ENV_LOG_FILE: &str = "REGSTATS_LOG_FILE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidOverride { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL of the metrics API, without a trailing slash.
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub per_page: usize,
    pub report_prefix: String,
    pub output_dir: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            api_base_url: "http://localhost:8000/api".to_string(),
            request_timeout_secs: 30,
            per_page: DEFAULT_PER_PAGE,
            report_prefix: DEFAULT_REPORT_PREFIX.to_string(),
            output_dir: PathBuf::from("."),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl DashboardConfig {
    /// Reads the optional JSON file, then applies `REGSTATS_*` environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides from `lookup` (the environment, in production) and
    /// validates the result.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_SECS) {
            self.request_timeout_secs = parse_override(ENV_TIMEOUT_SECS, &value)?;
        }
        if let Some(value) = lookup(ENV_PER_PAGE) {
            self.per_page = parse_override(ENV_PER_PAGE, &value)?;
        }
        if let Some(prefix) = lookup(ENV_REPORT_PREFIX) {
            self.report_prefix = prefix;
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(file) = lookup(ENV_LOG_FILE) {
            self.log_file = Some(PathBuf::from(file));
        }

        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Zero("request_timeout_secs"));
        }
        if self.per_page == 0 {
            return Err(ConfigError::Zero("per_page"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_override<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidOverride {
        key,
        value: value.to_string(),
    })
}
