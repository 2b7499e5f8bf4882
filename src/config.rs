//! Engine configuration.
//!
//! Type-safe configuration loaded from environment variables with the
//! `SPRINT_POKER_` prefix; nested values use double underscores as
//! separators. Every value has a sensible default for local development.
//!
//! # Example
//!
//! ```no_run
//! use sprint_poker::config::EngineConfig;
//!
//! let config = EngineConfig::load().expect("Failed to load configuration");
//! println!("change buffer: {}", config.sync.change_buffer);
//! ```

use config::Config;
use serde::Deserialize;
use thiserror::Error;

/// Default capacity of the change-feed broadcast buffer.
pub const DEFAULT_CHANGE_BUFFER: usize = 64;

const fn default_change_buffer() -> usize {
    DEFAULT_CHANGE_BUFFER
}

fn default_log_filter() -> String {
    "sprint_poker=info".to_string()
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Change buffer capacity must be positive")]
    InvalidChangeBuffer,
}

/// Synchronization tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Capacity of the change-feed buffer. Notifications dropped past it
    /// are coalesced by the next full re-fetch.
    #[serde(default = "default_change_buffer")]
    pub change_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            change_buffer: DEFAULT_CHANGE_BUFFER,
        }
    }
}

/// Root engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Log filter directive handed to the host's tracing subscriber.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Synchronization tuning.
    #[serde(default)]
    pub sync: SyncConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            sync: SyncConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the environment.
    ///
    /// Reads a `.env` file when present, then applies `SPRINT_POKER_`
    /// variables over the defaults.
    ///
    /// # Errors
    ///
    /// - `Load` when the environment cannot be parsed
    /// - `InvalidChangeBuffer` when validation fails
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config: EngineConfig = Config::builder()
            .add_source(config::Environment::with_prefix("SPRINT_POKER").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.change_buffer == 0 {
            return Err(ConfigError::InvalidChangeBuffer);
        }
        Ok(())
    }
}
