//! Physical storage configuration.

use serde::{Deserialize, Serialize};

/// Physical store and staging area configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one sub-directory per user.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// Directory, relative to `data_root`, where the upload collaborator
    /// deposits completed blobs and their `.info` records.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            staging_dir: default_staging_dir(),
        }
    }
}

/// Per-user quota defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Limit assigned to newly provisioned users (default 10 GB).
    #[serde(default = "default_limit")]
    pub default_limit_bytes: i64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            default_limit_bytes: default_limit(),
        }
    }
}

fn default_data_root() -> String {
    "./data/uploads".to_string()
}

fn default_staging_dir() -> String {
    "_staging".to_string()
}

fn default_limit() -> i64 {
    10_737_418_240 // 10 GB
}
