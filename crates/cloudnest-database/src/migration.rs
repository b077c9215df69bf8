//! Schema migrations embedded from the workspace `migrations/` directory.

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use tracing::info;

use cloudnest_core::error::{AppError, ErrorKind};
use cloudnest_core::result::AppResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Apply whatever part of the schema the database has not seen yet.
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    let latest = MIGRATOR.iter().map(|m| m.version).max().unwrap_or_default();
    MIGRATOR.run(pool).await.map_err(|e| {
        AppError::with_source(ErrorKind::Internal, "Schema migration failed", e)
    })?;
    info!(schema_version = latest, "Metadata schema up to date");
    Ok(())
}
