//! Configuration loader.
//!
//! Settings are read from a TOML file, by default `config.toml` in the
//! platform config directory (`~/.config/logsdash/` on Linux). A missing file
//! yields defaults; an unreadable or malformed one is an error.
//!
//! # config.toml Format
//!
//! ```toml
//! region = "us-east-1"
//! profile = "dev"
//!
//! [server]
//! bind = "127.0.0.1:7878"
//!
//! [queries]
//! default_limit = 1000
//! describe_limit = 50
//! max_concurrency = 4
//! operation_timeout_secs = 30
//! ```

#![warn(clippy::all, rust_2018_idioms)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::app::log_actions::discovery::DEFAULT_DESCRIBE_LIMIT;
use crate::app::log_actions::lifecycle::DEFAULT_QUERY_LIMIT;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// AWS region; falls back to the SDK default chain
    pub region: Option<String>,
    /// Named AWS profile; falls back to the SDK default chain
    pub profile: Option<String>,
    pub server: ServerConfig,
    pub queries: QueryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the API server listens on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:7878".to_string(),
        }
    }
}

/// Limits applied to log actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Result limit for StartQuery when the request gives none
    pub default_limit: i32,
    /// Log group limit for DescribeLogGroups when the request gives none
    pub describe_limit: i32,
    /// Requests of one batch executed at the same time
    pub max_concurrency: usize,
    /// Upper bound for a single remote call
    pub operation_timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_QUERY_LIMIT,
            describe_limit: DEFAULT_DESCRIBE_LIMIT,
            max_concurrency: 4,
            operation_timeout_secs: 30,
        }
    }
}

impl LogsConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "", "logsdash")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`, or from [`LogsConfig::default_path`] when `None`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => {
                log_debug!("No config directory available, using defaults");
                return Ok(Self::default());
            }
        };

        if !path.exists() {
            log_debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let config = Self::from_toml(&contents).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse { path: path.clone(), source },
            other => other,
        })?;

        log_debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let q = &self.queries;
        if q.default_limit < 1 {
            return Err(ConfigError::Invalid("queries.default_limit must be at least 1".into()));
        }
        if q.describe_limit < 1 {
            return Err(ConfigError::Invalid("queries.describe_limit must be at least 1".into()));
        }
        if q.max_concurrency == 0 {
            return Err(ConfigError::Invalid("queries.max_concurrency must be at least 1".into()));
        }
        Ok(())
    }
}
