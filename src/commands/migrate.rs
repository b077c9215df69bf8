//! Database migration and health commands.

use clap::{Args, Subcommand};

use cloudnest_core::config::{AppConfig, MetadataBackend};
use cloudnest_core::error::AppError;

use crate::app::App;
use crate::output;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Check that the metadata store and data root are reachable
    Check,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> Result<(), AppError> {
    match &args.command {
        MigrateCommand::Run => {
            if config.metadata.backend == MetadataBackend::Memory {
                output::print_warning("The memory backend has no schema; nothing to migrate.");
                return Ok(());
            }
            println!("Running database migrations...");
            let pool = cloudnest_database::connect(&config.database).await?;
            cloudnest_database::migration::run_migrations(&pool).await?;
            pool.close().await;
            output::print_success("All migrations applied successfully.");
        }
        MigrateCommand::Check => {
            let app = App::build(config).await?;
            let store_ok = app.store.health_check().await?;
            let storage_ok = app.storage.health_check().await?;
            output::print_kv("Metadata store", app.store.backend());
            output::print_kv("Metadata reachable", &store_ok.to_string());
            output::print_kv("Data root", &config.storage.data_root);
            output::print_kv("Data root writable", &storage_ok.to_string());
            if store_ok && storage_ok {
                output::print_success("CloudNest is ready.");
            } else {
                output::print_warning("CloudNest is not ready.");
            }
        }
    }

    Ok(())
}
