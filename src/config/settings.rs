//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Flat environment variables recognised on top of the `T2I__` prefixed ones.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("SERVER_READ_TIMEOUT_SECS", "server.read_timeout_secs"),
    ("SERVER_WRITE_TIMEOUT_SECS", "server.write_timeout_secs"),
    ("MODELSLAB_BASE_URL", "remote.base_url"),
    ("MODELSLAB_API_KEY", "remote.api_key"),
    ("MODELSLAB_MAX_RETRIES", "remote.max_retries"),
    ("MODELSLAB_RETRY_BACKOFF_MS", "remote.retry_backoff_ms"),
    ("MODELSLAB_TIMEOUT_SECS", "remote.timeout_secs"),
    ("MODELSLAB_API_KEY_PLACEMENT", "remote.api_key_placement"),
    ("MODELSLAB_POLL_INTERVAL_MS", "polling.interval_ms"),
    ("MODELSLAB_MAX_POLL_ATTEMPTS", "polling.max_attempts"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub remote: RemoteConfig,
    pub polling: PollingConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for receiving a request body
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    /// Upper bound for producing a response, polling included
    #[serde(default = "default_write_timeout")]
    pub write_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_read_timeout() -> u64 {
    5
}

fn default_write_timeout() -> u64 {
    90
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }
}

/// Where the remote API key travels on submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyPlacement {
    /// `key` field of the JSON body
    #[default]
    Body,
    /// `Authorization: Bearer` header
    Header,
}

/// Remote generation API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub api_key_placement: ApiKeyPlacement,
}

impl RemoteConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    "https://modelslab.com/api/v6".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    1000
}

fn default_remote_timeout() -> u64 {
    30
}

/// Polling of asynchronous remote jobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
    #[serde(default = "default_max_poll_attempts")]
    pub max_attempts: u32,
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_max_poll_attempts() -> u32 {
    30
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Longest time a request can spend waiting on a remote job
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.interval_ms.saturating_mul(self.max_attempts as u64))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let builder = Config::builder()
            // Start with default values
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("server.read_timeout_secs", default_read_timeout() as i64)?
            .set_default("server.write_timeout_secs", default_write_timeout() as i64)?
            .set_default("remote.base_url", default_base_url())?
            .set_default("remote.api_key", "")?
            .set_default("remote.max_retries", default_max_retries() as i64)?
            .set_default("remote.retry_backoff_ms", default_retry_backoff() as i64)?
            .set_default("remote.timeout_secs", default_remote_timeout() as i64)?
            .set_default("remote.api_key_placement", "body")?
            .set_default("polling.interval_ms", default_poll_interval() as i64)?
            .set_default("polling.max_attempts", default_max_poll_attempts() as i64)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            // Load from configuration file
            .add_source(File::from(path.as_ref()).required(false))
            // Override with environment variables (prefixed with T2I__)
            .add_source(
                Environment::with_prefix("T2I")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = apply_env_overrides(builder)?.build()?;
        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }

        if self.remote.api_key.trim().is_empty() {
            return Err(invalid(
                "MODELSLAB_API_KEY environment variable is required",
            ));
        }

        if !self.remote.base_url.starts_with("http://")
            && !self.remote.base_url.starts_with("https://")
        {
            return Err(invalid(&format!(
                "Remote base URL '{}' must start with http:// or https://",
                self.remote.base_url
            )));
        }

        if self.remote.max_retries == 0 {
            return Err(invalid("Remote max_retries must be at least 1"));
        }

        if self.polling.interval_ms == 0 || self.polling.max_attempts == 0 {
            return Err(invalid(
                "Polling interval and max attempts must both be greater than 0",
            ));
        }

        Ok(())
    }
}

fn apply_env_overrides(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>> {
    for (var, key) in ENV_OVERRIDES {
        let value = std::env::var(var).ok().filter(|v| !v.is_empty());
        builder = builder.set_override_option(*key, value)?;
    }
    Ok(builder)
}

fn invalid(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                read_timeout_secs: default_read_timeout(),
                write_timeout_secs: default_write_timeout(),
            },
            remote: RemoteConfig {
                base_url: default_base_url(),
                api_key: String::new(),
                max_retries: default_max_retries(),
                retry_backoff_ms: default_retry_backoff(),
                timeout_secs: default_remote_timeout(),
                api_key_placement: ApiKeyPlacement::Body,
            },
            polling: PollingConfig {
                interval_ms: default_poll_interval(),
                max_attempts: default_max_poll_attempts(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
        }
    }
}
