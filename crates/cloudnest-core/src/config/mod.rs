//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! an optional TOML file overlaid with `CLOUDNEST__*` environment variables.

pub mod database;
pub mod logging;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::storage::{QuotaConfig, StorageConfig};

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Metadata store backend selection.
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Physical store settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Quota defaults.
    #[serde(default)]
    pub quota: QuotaConfig,
    /// Archive naming settings.
    #[serde(default)]
    pub archive: ArchiveConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which metadata store implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataBackend {
    /// PostgreSQL via the connection pool in [`DatabaseConfig`].
    #[default]
    Postgres,
    /// Process-local store; contents are lost on exit.
    Memory,
}

/// Metadata store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub backend: MetadataBackend,
    /// Run pending migrations when connecting.
    #[serde(default)]
    pub auto_migrate: bool,
}

/// Archive builder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Prefix of the generated name for multi-item archives.
    #[serde(default = "default_bulk_prefix")]
    pub bulk_name_prefix: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            bulk_name_prefix: default_bulk_prefix(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file.
    ///
    /// Environment variables prefixed with `CLOUDNEST__` override file
    /// values, e.g. `CLOUDNEST__STORAGE__DATA_ROOT=/srv/uploads`.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CLOUDNEST")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::internal(format!("Failed to deserialize config: {e}")))
    }
}

fn default_bulk_prefix() -> String {
    "CloudNest-Bulk".to_string()
}
