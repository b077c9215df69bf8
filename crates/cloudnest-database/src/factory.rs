//! Metadata store selection from configuration.

use std::sync::Arc;

use tracing::info;

use cloudnest_core::config::{AppConfig, MetadataBackend};
use cloudnest_core::result::AppResult;

use crate::connection::connect;
use crate::memory::MemoryMetadataStore;
use crate::migration::run_migrations;
use crate::postgres::PgMetadataStore;
use crate::store::MetadataStore;

/// Build the metadata store named by `metadata.backend`.
pub async fn open_store(config: &AppConfig) -> AppResult<Arc<dyn MetadataStore>> {
    match config.metadata.backend {
        MetadataBackend::Postgres => {
            let pool = connect(&config.database).await?;
            if config.metadata.auto_migrate {
                run_migrations(&pool).await?;
            }
            info!(backend = "postgres", "Metadata store ready");
            Ok(Arc::new(PgMetadataStore::new(pool)))
        }
        MetadataBackend::Memory => {
            info!(backend = "memory", "Metadata store ready (contents are not persisted)");
            Ok(Arc::new(MemoryMetadataStore::new()))
        }
    }
}
