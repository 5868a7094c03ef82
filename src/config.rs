//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `STOCKTAKE_*` environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::variance::{Thresholds, DEFAULT_HIGH_THRESHOLD, DEFAULT_MEDIUM_THRESHOLD};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub variance: VarianceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which store backs the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    Remote,
    Memory,
}

impl Backend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "local" => Some(Backend::Sqlite),
            "remote" | "supabase" | "postgrest" => Some(Backend::Remote),
            "memory" | "sample" => Some(Backend::Memory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
            Backend::Remote => "remote",
            Backend::Memory => "memory",
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: Backend,

    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default = "default_remote_url")]
    pub remote_url: String,

    #[serde(default)]
    pub remote_api_key: String,

    #[serde(default = "default_remote_timeout")]
    pub remote_timeout_ms: u64,

    #[serde(default = "default_fallback")]
    pub fallback_to_sample_data: bool,
}

fn default_backend() -> Backend {
    Backend::Sqlite
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("stocktake").join("stocktake.db").to_string_lossy().to_string())
        .unwrap_or_else(|| "./stocktake.db".to_string())
}

fn default_remote_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_remote_timeout() -> u64 {
    5000
}

fn default_fallback() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            database_path: default_database_path(),
            remote_url: default_remote_url(),
            remote_api_key: String::new(),
            remote_timeout_ms: default_remote_timeout(),
            fallback_to_sample_data: default_fallback(),
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    /// Socket address string to bind
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Variance severity thresholds, in percent of book inventory
#[derive(Debug, Clone, Deserialize)]
pub struct VarianceConfig {
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,

    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,
}

fn default_high_threshold() -> f64 {
    DEFAULT_HIGH_THRESHOLD
}

fn default_medium_threshold() -> f64 {
    DEFAULT_MEDIUM_THRESHOLD
}

impl Default for VarianceConfig {
    fn default() -> Self {
        Self {
            high_threshold: default_high_threshold(),
            medium_threshold: default_medium_threshold(),
        }
    }
}

impl VarianceConfig {
    /// Thresholds for the calculator. Out-of-order values are swapped.
    pub fn thresholds(&self) -> Thresholds {
        let (medium, high) = if self.medium_threshold <= self.high_threshold {
            (self.medium_threshold, self.high_threshold)
        } else {
            (self.high_threshold, self.medium_threshold)
        };
        Thresholds { high, medium }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in Self::search_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Locations searched by [`Config::load_default`], in order
    pub fn search_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("stocktake").join("config.toml")),
            Some(PathBuf::from("/etc/stocktake/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup. Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Storage overrides
        if let Some(backend) = lookup("STOCKTAKE_BACKEND") {
            match Backend::parse(&backend) {
                Some(b) => self.storage.backend = b,
                None => tracing::warn!("Ignoring unknown STOCKTAKE_BACKEND {:?}", backend),
            }
        }
        if let Some(path) = lookup("STOCKTAKE_DATABASE_PATH") {
            self.storage.database_path = path;
        }
        if let Some(url) = lookup("STOCKTAKE_REMOTE_URL") {
            self.storage.remote_url = url;
        }
        if let Some(key) = lookup("STOCKTAKE_REMOTE_KEY") {
            self.storage.remote_api_key = key;
        }

        // API overrides
        if let Some(host) = lookup("STOCKTAKE_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = lookup("STOCKTAKE_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Logging overrides
        if let Some(level) = lookup("STOCKTAKE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("STOCKTAKE_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Stocktake Configuration
#
# Environment variables override these settings:
# - STOCKTAKE_BACKEND
# - STOCKTAKE_DATABASE_PATH
# - STOCKTAKE_REMOTE_URL
# - STOCKTAKE_REMOTE_KEY
# - STOCKTAKE_API_HOST
# - STOCKTAKE_API_PORT
# - STOCKTAKE_LOG_LEVEL
# - STOCKTAKE_LOG_FORMAT

[storage]
# Backend: sqlite, remote or memory
backend = "sqlite"

# SQLite database file
database_path = "./stocktake.db"

# Hosted Postgres (PostgREST) endpoint and key
remote_url = "http://localhost:54321"
remote_api_key = ""

# Remote request timeout (ms)
remote_timeout_ms = 5000

# Serve built-in sample data if the backend fails
fallback_to_sample_data = true

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8090

# Allowed CORS origins (empty allows any)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 30

[variance]
# Severity thresholds in percent of book inventory
high_threshold = 10.0
medium_threshold = 5.0

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/stocktake/stocktake.log"
"#
    .to_string()
}
