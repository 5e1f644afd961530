//! # retrace-config
//!
//! Layered configuration loading for Retrace using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`RETRACE_*` prefix, `__` as separator)
//! 2. Project-level `.retrace/config.toml`
//! 3. User-level `~/.config/retrace/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `RETRACE_DATABASE__PATH` -> `database.path` and
//! `RETRACE_HISTORY__EMPTY_INCOMING` -> `history.empty_incoming`.
//!
//! ```no_run
//! use retrace_config::RetraceConfig;
//!
//! let config = RetraceConfig::load_with_dotenv().expect("config");
//! println!("history database: {}", config.database.path);
//! ```

mod database;
mod error;
mod history;

pub use database::{DEFAULT_DATABASE_PATH, DatabaseConfig};
pub use error::ConfigError;
pub use history::HistoryConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project-local config file, relative to the working directory.
pub const PROJECT_CONFIG_PATH: &str = ".retrace/config.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RetraceConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl RetraceConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`RetraceConfig::load_with_dotenv`] for
    /// `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if extraction fails or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration after reading a `.env` file from the working
    /// directory, if one exists.
    ///
    /// # Errors
    ///
    /// Same as [`RetraceConfig::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests and callers can add providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(PROJECT_CONFIG_PATH);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("RETRACE_").split("__"))
    }

    /// Reject values that would make the store unusable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an empty database path or a
    /// zero default limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.history.default_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history.default_limit".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("retrace").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrace_core::EmptyIncomingPolicy;

    #[test]
    fn default_config_is_valid() {
        let config = RetraceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history.empty_incoming, EmptyIncomingPolicy::Reject);
    }

    #[test]
    fn empty_path_rejected() {
        let mut config = RetraceConfig::default();
        config.database.path = "  ".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "database.path"
        ));
    }

    #[test]
    fn zero_limit_rejected() {
        let mut config = RetraceConfig::default();
        config.history.default_limit = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "history.default_limit"
        ));
    }
}
