//! Trash lifecycle CLI commands.

use clap::{Args, Subcommand};

use cloudnest_core::config::AppConfig;
use cloudnest_core::error::AppError;
use cloudnest_core::types::ItemId;

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for trash commands
#[derive(Debug, Args)]
pub struct TrashArgs {
    /// Trash subcommand
    #[command(subcommand)]
    pub command: TrashCommand,
}

/// Trash subcommands
#[derive(Debug, Subcommand)]
pub enum TrashCommand {
    /// Move items to the trash (all or nothing)
    Put {
        /// Logical paths
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Trash items by ID, e.g. `file:42` or `folder:<uuid>`
    Bulk {
        /// Item IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Restore the most recently trashed items at these paths
    Restore {
        /// Logical paths
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// List trashed items
    List,
    /// Permanently delete a trashed item and free its quota
    Purge {
        /// Logical path of the trashed item
        path: String,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// Execute trash commands
pub async fn execute(
    args: &TrashArgs,
    config: &AppConfig,
    acting: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let app = App::build(config).await?;
    let ctx = app.act_as(acting).await?;

    match &args.command {
        TrashCommand::Put { paths } => {
            let count = app.namespace.trash(&ctx, paths).await?;
            output::print_success(&format!("{} item(s) moved to the trash", count));
        }
        TrashCommand::Bulk { ids } => {
            let ids = ids
                .iter()
                .map(|raw| raw.parse::<ItemId>())
                .collect::<Result<Vec<_>, _>>()?;
            let count = app.namespace.trash_by_ids(&ctx, &ids).await?;
            output::print_success(&format!("{} item(s) moved to the trash", count));
        }
        TrashCommand::Restore { paths } => {
            let count = app.namespace.restore(&ctx, paths).await?;
            output::print_success(&format!("{} item(s) restored", count));
        }
        TrashCommand::List => {
            let entries = app.namespace.list_trash(&ctx).await?;
            output::print_entries(&entries, format);
        }
        TrashCommand::Purge { path, force } => {
            if !force {
                let confirm = dialoguer::Confirm::new()
                    .with_prompt(format!(
                        "Permanently delete '{}' and everything under it? This cannot be undone",
                        path
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| AppError::internal(format!("Input error: {}", e)))?;

                if !confirm {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let report = app.namespace.permanently_delete(&ctx, path).await?;
            match format {
                OutputFormat::Json => output::print_item(&report, format),
                OutputFormat::Table => {
                    output::print_kv("Files removed", &report.files_removed.to_string());
                    output::print_kv("Folders removed", &report.folders_removed.to_string());
                    output::print_kv("Freed", &output::human_bytes(report.bytes_freed));
                }
            }
            for orphan in &report.orphans {
                output::print_warning(&format!("Left on disk: {}", orphan));
            }
            output::print_success(&format!("'{}' permanently deleted", path));
        }
    }

    Ok(())
}
