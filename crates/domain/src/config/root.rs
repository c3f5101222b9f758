use serde::{Deserialize, Serialize};

use super::cache::CacheConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;

/// Main configuration structure for Ferrous Cache
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Cache namespaces and eviction tuning
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. ferrous-cache.toml in current directory
    /// 3. /etc/ferrous-cache/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(path) = Self::get_config_path() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if !overrides.namespaces.is_empty() {
            self.cache.namespaces = overrides.namespaces;
        }
    }

    /// Validate configuration
    ///
    /// Duplicate namespace names are not checked here: the cache refuses
    /// to start with them, which is the authoritative check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.namespaces.is_empty() {
            return Err(ConfigError::Validation(
                "No cache namespaces configured".to_string(),
            ));
        }

        if let Some(blank) = self.cache.namespaces.iter().find(|n| n.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "Cache namespace name cannot be blank: '{}'",
                blank
            )));
        }

        if self.cache.eviction_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "Eviction interval cannot be 0".to_string(),
            ));
        }

        if self.cache.eviction_queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "Eviction queue capacity cannot be 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        if std::path::Path::new("ferrous-cache.toml").exists() {
            Some("ferrous-cache.toml".to_string())
        } else if std::path::Path::new("/etc/ferrous-cache/config.toml").exists() {
            Some("/etc/ferrous-cache/config.toml".to_string())
        } else {
            None
        }
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub log_level: Option<String>,
    pub namespaces: Vec<String>,
}
