//! Configuration loading and typed config structures for a Covey session.
//!
//! The canonical configuration lives in `covey-config.yaml` at the project
//! root. Every section is optional and falls back to the defaults defined
//! here. Area geometry is not validated at parse time; that happens when the
//! [`AreaLayout`](covey_world::AreaLayout) is built at startup.

use std::path::Path;
use std::time::Duration;

use covey_enrichment::spotify::DEFAULT_API_URL;
use covey_types::AreaConfig;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level session configuration.
///
/// Mirrors the structure of `covey-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CoveyConfig {
    /// Town-level settings.
    #[serde(default)]
    pub town: TownConfig,

    /// Conversation areas, in registration order.
    #[serde(default)]
    pub areas: Vec<AreaConfig>,

    /// Music-service enrichment settings.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CoveyConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `COVEY_HOST` overrides `server.host`
    /// - `COVEY_PORT` overrides `server.port`
    /// - `MUSIC_API_URL` overrides `enrichment.api_url`
    /// - `ENRICHMENT_ENABLED` overrides `enrichment.enabled`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string and apply env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply the process environment on top of the current values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Unparseable values are
    /// logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("COVEY_HOST") {
            self.server.host = val;
        }
        if let Some(val) = lookup("COVEY_PORT") {
            match val.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %val, "ignoring invalid COVEY_PORT"),
            }
        }
        if let Some(val) = lookup("MUSIC_API_URL") {
            self.enrichment.api_url = val;
        }
        if let Some(val) = lookup("ENRICHMENT_ENABLED") {
            match parse_flag(&val) {
                Some(enabled) => self.enrichment.enabled = enabled,
                None => tracing::warn!(value = %val, "ignoring invalid ENRICHMENT_ENABLED"),
            }
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Town-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TownConfig {
    /// Human-readable town name, shown on the status page.
    #[serde(default = "default_town_name")]
    pub name: String,

    /// Capacity of the session writer's command queue.
    #[serde(default = "default_command_buffer")]
    pub command_buffer: usize,
}

impl Default for TownConfig {
    fn default() -> Self {
        Self {
            name: default_town_name(),
            command_buffer: default_command_buffer(),
        }
    }
}

/// Music-service enrichment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnrichmentConfig {
    /// Whether enrichment runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the music catalog API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Transport-level timeout for a single HTTP request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Deadline for each of the three fetches in a round.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Interval between scheduled refresh sweeps.
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,

    /// Maximum number of participants refreshed at the same time.
    #[serde(default = "default_max_concurrent_refreshes")]
    pub max_concurrent_refreshes: usize,
}

impl EnrichmentConfig {
    /// Per-request HTTP timeout.
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Per-fetch deadline.
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Sweep interval.
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_api_url(),
            request_timeout_ms: default_request_timeout_ms(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            refresh_interval_ms: default_refresh_interval_ms(),
            max_concurrent_refreshes: default_max_concurrent_refreshes(),
        }
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Output format for the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

fn default_town_name() -> String {
    "Covey Town".to_owned()
}

const fn default_command_buffer() -> usize {
    256
}

const fn default_true() -> bool {
    true
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_owned()
}

const fn default_request_timeout_ms() -> u64 {
    5_000
}

const fn default_fetch_timeout_ms() -> u64 {
    3_000
}

const fn default_refresh_interval_ms() -> u64 {
    30_000
}

const fn default_max_concurrent_refreshes() -> usize {
    8
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}
