//! Client configuration loading and validation.

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_SOCKET_URL: &str = "ws://localhost:3000/ws";

/// Errors raised while loading or validating [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// YAML parse or serialize failure.
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yml::Error),
    /// JSON parse or serialize failure.
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// The file extension is neither YAML nor JSON.
    #[error("Unsupported configuration format. Use 'yaml' or 'json'.")]
    UnsupportedFormat,
    /// A `CHATTERLY_*` variable holds a malformed value.
    #[error("Invalid {var} value: {reason}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// A cross-field rule failed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Output format for the tracing subscriber.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines with ANSI colours.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Logging settings consumed by the binary's subscriber setup.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// The main configuration structure for the Chatterly client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the REST API.
    pub api_url: Url,

    /// WebSocket endpoint of the live event channel.
    pub socket_url: Url,

    /// Directory holding the persisted session entries.
    pub data_dir: PathBuf,

    /// Messages fetched per history page.
    pub page_size: u32,

    /// Idle time after the last keystroke before `typing:stop` is sent.
    pub typing_idle_ms: u64,

    /// Fixed delay between live channel reconnection attempts.
    pub reconnect_delay_ms: u64,

    /// Timeout applied to every REST call.
    pub request_timeout_secs: u64,

    /// Subscriber settings.
    pub logging: LoggingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ClientConfig {
    /// Generates a default configuration.
    ///
    /// # Panics
    /// Never in practice: the default URLs are compile-time constants that parse.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL parses"),
            socket_url: Url::parse(DEFAULT_SOCKET_URL).expect("default socket URL parses"),
            data_dir: default_data_dir(),
            page_size: 50,
            typing_idle_ms: 2000,
            reconnect_delay_ms: 1000,
            request_timeout_secs: 30,
            logging: LoggingConfig::default(),
        }
    }

    /// Loads the configuration from a file, environment variables, or defaults.
    ///
    /// Precedence, lowest first: defaults, the file at `config_path` (YAML or
    /// JSON by extension), `CHATTERLY_*` environment variables for values the
    /// file left at their default, then `api_url_override`.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the file cannot be read or parsed, an
    /// environment variable is malformed, or validation fails.
    pub fn load_config(
        config_path: Option<&Path>,
        api_url_override: Option<Url>,
    ) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, api_url_override, &|key| env::var(key).ok())
    }

    fn load_with_env(
        config_path: Option<&Path>,
        api_url_override: Option<Url>,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => Self::with_defaults(),
        };

        config.apply_env_overrides(lookup)?;

        if let Some(api_url) = api_url_override {
            config.api_url = api_url;
        }

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(std::ffi::OsStr::to_str) {
            Some("yaml" | "yml") => Ok(serde_yml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(ConfigError::UnsupportedFormat),
        }
    }

    fn apply_env_overrides(
        &mut self,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let defaults = Self::with_defaults();

        if self.api_url == defaults.api_url
            && let Some(value) = lookup("CHATTERLY_API_URL")
        {
            self.api_url = parse_url_env("CHATTERLY_API_URL", &value)?;
        }
        if self.socket_url == defaults.socket_url
            && let Some(value) = lookup("CHATTERLY_SOCKET_URL")
        {
            self.socket_url = parse_url_env("CHATTERLY_SOCKET_URL", &value)?;
        }
        if self.data_dir == defaults.data_dir
            && let Some(value) = lookup("CHATTERLY_DATA_DIR")
        {
            self.data_dir = PathBuf::from(value);
        }
        if self.logging.level == defaults.logging.level
            && let Some(value) = lookup("CHATTERLY_LOG_LEVEL")
        {
            self.logging.level = value;
        }
        if self.logging.format == defaults.logging.format
            && let Some(value) = lookup("CHATTERLY_LOG_FORMAT")
        {
            self.logging.format = value
                .parse()
                .map_err(|reason| ConfigError::InvalidEnv {
                    var: "CHATTERLY_LOG_FORMAT",
                    reason,
                })?;
        }

        Ok(())
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first violated rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.api_url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "api_url must use http or https, got '{}'",
                self.api_url.scheme()
            )));
        }
        if !matches!(self.socket_url.scheme(), "ws" | "wss") {
            return Err(ConfigError::Invalid(format!(
                "socket_url must use ws or wss, got '{}'",
                self.socket_url.scheme()
            )));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid(
                "page_size must be greater than 0".to_string(),
            ));
        }
        if self.typing_idle_ms == 0 {
            return Err(ConfigError::Invalid(
                "typing_idle_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Serialize for `chatterly config --format yaml`.
    ///
    /// # Errors
    /// Propagates serializer failures.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yml::to_string(self)?)
    }

    /// Serialize for `chatterly config --format json`.
    ///
    /// # Errors
    /// Propagates serializer failures.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn parse_url_env(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|err| ConfigError::InvalidEnv {
        var,
        reason: err.to_string(),
    })
}

fn default_data_dir() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join("chatterly"))
        .unwrap_or_else(|| PathBuf::from("./.chatterly"))
}
