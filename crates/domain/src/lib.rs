//! Ferrous Cache Domain Layer
pub mod config;
pub mod errors;
pub mod kv_keys;
pub mod namespaces;

pub use config::{CacheConfig, CliOverrides, Config, ConfigError, LoggingConfig};
pub use errors::CacheError;
pub use kv_keys::map_key;
