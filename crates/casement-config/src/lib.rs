//! Casement Configuration Management
//!
//! Handles loading window manager tunables from ~/.casement/config.toml.
//! Every field has a default, so partial files are accepted.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration directory name
const CONFIG_DIR_NAME: &str = ".casement";
/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Logging configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// env_logger filter used when RUST_LOG is not set
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "warn,casement=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

/// Window pool configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum pooled instances kept per window class
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: usize,

    /// Trim pools every N seconds of frame time (disabled when absent)
    #[serde(default)]
    pub optimize_interval_secs: Option<f32>,
}

fn default_max_pool_size() -> usize {
    50
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_pool_size: default_max_pool_size(),
            optimize_interval_secs: None,
        }
    }
}

/// Inter-window messaging configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Capacity of each priority queue
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,
}

fn default_max_queue_size() -> usize {
    1000
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            max_queue_size: default_max_queue_size(),
        }
    }
}

/// Focus tracking configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusConfig {
    /// Number of focus changes kept for diagnostics
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_history_capacity() -> usize {
    100
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
        }
    }
}

/// Modal overlay configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Alpha of the dimming layer drawn under a topmost modal (0.0 - 1.0)
    #[serde(default = "default_dim_alpha")]
    pub dim_alpha: f32,
}

fn default_dim_alpha() -> f32 {
    0.5
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            dim_alpha: default_dim_alpha(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Pool settings
    #[serde(default)]
    pub pool: PoolConfig,

    /// Messaging settings
    #[serde(default)]
    pub messaging: MessagingConfig,

    /// Focus settings
    #[serde(default)]
    pub focus: FocusConfig,

    /// Overlay settings
    #[serde(default)]
    pub overlay: OverlayConfig,
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_file_path()?;

        if !config_path.exists() {
            log::info!("Config file not found, creating default at {:?}", config_path);
            Self::create_default_config()?;
        }

        let config = Self::load_from(&config_path)?;
        log::info!("Loaded configuration from {:?}", config_path);
        Ok(config)
    }

    /// Load configuration, falling back to defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            log::warn!("{}; using default configuration", e);
            Self::default()
        })
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the window manager cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.messaging.max_queue_size == 0 {
            return Err(ConfigError::InvalidValue(
                "messaging.max_queue_size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.overlay.dim_alpha) {
            return Err(ConfigError::InvalidValue(format!(
                "overlay.dim_alpha must be within 0.0..=1.0, got {}",
                self.overlay.dim_alpha
            )));
        }
        if let Some(interval) = self.pool.optimize_interval_secs
            && interval <= 0.0
        {
            return Err(ConfigError::InvalidValue(format!(
                "pool.optimize_interval_secs must be positive, got {}",
                interval
            )));
        }
        Ok(())
    }

    /// Get the configuration directory path (~/.casement/)
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(CONFIG_DIR_NAME))
    }

    /// Get the configuration file path (~/.casement/config.toml)
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Create the default configuration file and directory
    pub fn create_default_config() -> Result<(), ConfigError> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir)
            .map_err(|e| ConfigError::CreateDirError(config_dir.clone(), e))?;
        Self::write_default_to(&Self::config_file_path()?)
    }

    /// Write the commented default configuration to `path`
    pub fn write_default_to(path: &Path) -> Result<(), ConfigError> {
        let toml_content =
            toml::to_string_pretty(&Config::default()).map_err(ConfigError::SerializeError)?;

        let content = format!(
            "# Casement Window Manager Configuration\n\
             #\n\
             # pool.optimize_interval_secs enables periodic pool trimming.\n\
             # RUST_LOG overrides logging.filter.\n\
             \n\
             {toml_content}"
        );

        fs::write(path, content).map_err(|e| ConfigError::WriteError(path.to_path_buf(), e))?;

        log::info!("Created default configuration at {:?}", path);
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    /// Home directory not found
    NoHomeDirectory,
    /// Failed to read config file
    ReadError(PathBuf, std::io::Error),
    /// Failed to parse config file
    ParseError(PathBuf, toml::de::Error),
    /// Failed to serialize config
    SerializeError(toml::ser::Error),
    /// Failed to write config file
    WriteError(PathBuf, std::io::Error),
    /// Failed to create directory
    CreateDirError(PathBuf, std::io::Error),
    /// A value is out of range
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NoHomeDirectory => write!(f, "Could not determine home directory"),
            ConfigError::ReadError(path, e) => write!(f, "Failed to read {:?}: {}", path, e),
            ConfigError::ParseError(path, e) => write!(f, "Failed to parse {:?}: {}", path, e),
            ConfigError::SerializeError(e) => write!(f, "Failed to serialize config: {}", e),
            ConfigError::WriteError(path, e) => write!(f, "Failed to write {:?}: {}", path, e),
            ConfigError::CreateDirError(path, e) => write!(f, "Failed to create {:?}: {}", path, e),
            ConfigError::InvalidValue(e) => write!(f, "Invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
