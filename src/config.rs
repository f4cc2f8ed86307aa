//! Configuration management for the delivery fee service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::DeliveryFeeError;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the delivery fee service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryFeeConfig {
    /// Weather feed configuration
    #[serde(default)]
    pub feed: FeedConfig,
    /// Observation store configuration
    #[serde(default)]
    pub store: StoreConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather feed configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// URL of the XML observations feed
    #[serde(default = "default_feed_url")]
    pub url: String,
    /// Request timeout in seconds
    #[serde(default = "default_feed_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_feed_max_retries")]
    pub max_retries: u32,
    /// Pause between the end of one ingestion and the start of the next
    #[serde(default = "default_feed_interval")]
    pub interval_minutes: u32,
    /// Delay before the first ingestion after startup
    #[serde(default)]
    pub initial_delay_seconds: u32,
}

/// Observation store configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store backend (fjall or memory)
    #[serde(default = "default_store_backend")]
    pub backend: String,
    /// Directory of the fjall database
    #[serde(default = "default_store_location")]
    pub location: String,
}

/// HTTP server configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// IANA time zone for request timestamps given without an offset
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_feed_url() -> String {
    "https://www.ilmateenistus.ee/ilma_andmed/xml/observations.php".to_string()
}

fn default_feed_timeout() -> u32 {
    30
}

fn default_feed_max_retries() -> u32 {
    3
}

fn default_feed_interval() -> u32 {
    10
}

fn default_store_backend() -> String {
    "fjall".to_string()
}

fn default_store_location() -> String {
    dirs::data_local_dir()
        .map(|dir| dir.join("deliveryfee"))
        .unwrap_or_else(|| PathBuf::from("data"))
        .to_string_lossy()
        .to_string()
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_time_zone() -> String {
    "Europe/Tallinn".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: default_feed_url(),
            timeout_seconds: default_feed_timeout(),
            max_retries: default_feed_max_retries(),
            interval_minutes: default_feed_interval(),
            initial_delay_seconds: 0,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            location: default_store_location(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            time_zone: default_time_zone(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl FeedConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_minutes) * 60)
    }

    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs(self.initial_delay_seconds.into())
    }
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed time zone; call after `validate`
    pub fn tz(&self) -> Result<Tz> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|e| DeliveryFeeError::config(format!("Invalid time zone '{}': {e}", self.time_zone)).into())
    }
}

impl DeliveryFeeConfig {
    /// Load configuration from `config_path`, or the default location when
    /// none is given, overlaid with environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. DELIVERYFEE_FEED__INTERVAL_MINUTES=5
        builder = builder.add_source(
            Environment::with_prefix("DELIVERYFEE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: DeliveryFeeConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("deliveryfee").join("config.toml"))
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.feed.timeout_seconds == 0 || self.feed.timeout_seconds > 300 {
            return Err(DeliveryFeeError::config(
                "Feed timeout must be between 1 and 300 seconds"
            ).into());
        }

        if self.feed.max_retries > 10 {
            return Err(DeliveryFeeError::config(
                "Feed max retries cannot exceed 10"
            ).into());
        }

        if self.feed.interval_minutes == 0 || self.feed.interval_minutes > 1440 {
            return Err(DeliveryFeeError::config(
                "Feed interval must be between 1 and 1440 minutes"
            ).into());
        }

        if self.server.port == 0 {
            return Err(DeliveryFeeError::config("Server port cannot be 0").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(DeliveryFeeError::config(
                format!("Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_log_levels.join(", ")
                )
            ).into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(DeliveryFeeError::config(
                format!("Invalid log format '{}'. Must be one of: {}",
                    self.logging.format,
                    valid_log_formats.join(", ")
                )
            ).into());
        }

        let valid_backends = ["fjall", "memory"];
        if !valid_backends.contains(&self.store.backend.as_str()) {
            return Err(DeliveryFeeError::config(
                format!("Invalid store backend '{}'. Must be one of: {}",
                    self.store.backend,
                    valid_backends.join(", ")
                )
            ).into());
        }

        if self.store.backend == "fjall" && self.store.location.is_empty() {
            return Err(DeliveryFeeError::config("Store location cannot be empty").into());
        }

        if !self.feed.url.starts_with("http://") && !self.feed.url.starts_with("https://") {
            return Err(DeliveryFeeError::config(
                "Feed URL must be a valid HTTP or HTTPS URL"
            ).into());
        }

        self.server.tz()?;

        Ok(())
    }
}
