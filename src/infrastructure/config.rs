//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (the production LSN-Online endpoints)
//! 2. `<user config dir>/lsn-client/config.toml` (optional)
//! 3. `lsn-client.toml` in the working directory, or an explicit file
//! 4. Environment variables prefixed with `LSN_` (`LSN_QUERY__RESULT_DELAY_MS=3000`)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domain::constants::{query, site};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    FileLoad {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LsnConfig {
    pub http: HttpConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

/// Remote endpoint and request identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Root of the statistics application
    pub base_url: String,
    /// Host redirect targets are resolved against
    pub host_url: String,
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub timeout_seconds: u64,
}

/// Query protocol settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Wait before fetching the result page; never below the site minimum
    pub result_delay_ms: u64,
    /// Value of the `LN2` form field
    pub secondary_level: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output (stderr)
    pub console_output: bool,

    /// Enable daily rotated file output
    pub file_output: bool,

    /// Log directory; defaults to `logs/` next to the executable
    pub log_dir: Option<PathBuf>,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

pub mod defaults {
    pub const TIMEOUT_SECONDS: u64 = 30;
    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const CONFIG_FILE_NAME: &str = "lsn-client";
    pub const ENV_PREFIX: &str = "LSN";
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: site::BASE_URL.to_string(),
            host_url: site::HOST_URL.to_string(),
            user_agent: site::USER_AGENT.to_string(),
            accept: site::ACCEPT.to_string(),
            accept_language: site::ACCEPT_LANGUAGE.to_string(),
            timeout_seconds: defaults::TIMEOUT_SECONDS,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            result_delay_ms: query::RESULT_READY_DELAY_MS,
            secondary_level: query::SECONDARY_LEVEL.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters.insert("selectors".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

impl HttpConfig {
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl QueryConfig {
    pub const fn result_delay(&self) -> Duration {
        Duration::from_millis(self.result_delay_ms)
    }
}

impl LsnConfig {
    /// Load defaults, the optional user and working-directory files, and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Same as [`LsnConfig::load`], with an explicit (required) file instead of
    /// `lsn-client.toml` in the working directory.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(user_file) = Self::user_config_file() {
            debug!("Looking for user config at {}", user_file.display());
            builder = builder.add_source(config::File::from(user_file).required(false));
        }

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder
                .add_source(config::File::with_name(defaults::CONFIG_FILE_NAME).required(false)),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// `<user config dir>/lsn-client/config.toml`
    pub fn user_config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(defaults::CONFIG_FILE_NAME).join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.query.result_delay_ms < query::RESULT_READY_DELAY_MS {
            return Err(ConfigError::Validation {
                message: format!(
                    "result_delay_ms must be at least {} (got {})",
                    query::RESULT_READY_DELAY_MS,
                    self.query.result_delay_ms
                ),
            });
        }

        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                message: "timeout_seconds must be greater than 0".to_string(),
            });
        }

        for (name, value) in [("base_url", &self.http.base_url), ("host_url", &self.http.host_url)] {
            url::Url::parse(value).map_err(|e| ConfigError::Validation {
                message: format!("{name} '{value}' is not a valid URL: {e}"),
            })?;
        }

        if self.http.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "user_agent must not be empty".to_string(),
            });
        }

        if self.query.secondary_level.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "secondary_level must not be empty".to_string(),
            });
        }

        Ok(())
    }
}
