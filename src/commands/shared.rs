//! Commands inside folders other users shared with the acting user.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use cloudnest_core::config::AppConfig;
use cloudnest_core::error::AppError;
use cloudnest_core::types::{FileId, FolderId, ItemId};

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for shared-space commands
#[derive(Debug, Args)]
pub struct SharedArgs {
    /// Shared subcommand
    #[command(subcommand)]
    pub command: SharedCommand,
}

/// Shared-space subcommands
#[derive(Debug, Subcommand)]
pub enum SharedCommand {
    /// List the visible contents of a shared folder
    Ls {
        /// Folder UUID
        folder: String,
    },
    /// Finalize a staged upload into a shared folder (charges the owner)
    Upload {
        /// Folder UUID
        folder: String,
        /// Staging id
        staging_id: String,
    },
    /// Create a folder inside a shared folder
    Mkdir {
        /// Parent folder UUID
        folder: String,
        /// New folder name
        name: String,
    },
    /// Move a shared item to its owner's trash
    Trash {
        /// Item ID, e.g. `file:42`
        item: String,
    },
    /// Write a shared file's content to stdout or a local file
    Cat {
        /// File ID
        file: i64,
        /// Write to this local file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Execute shared-space commands
pub async fn execute(
    args: &SharedArgs,
    config: &AppConfig,
    acting: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let app = App::build(config).await?;
    let ctx = app.act_as(acting).await?;

    match &args.command {
        SharedCommand::Ls { folder } => {
            let entries = app.shared.list_folder(&ctx, parse_folder(folder)?).await?;
            output::print_entries(&entries, format);
        }
        SharedCommand::Upload { folder, staging_id } => {
            let file = app
                .shared
                .upload(&ctx, parse_folder(folder)?, staging_id)
                .await?;
            output::print_success(&format!(
                "Stored {} ({}) in the owner's tree",
                file.full_path(),
                file.id
            ));
        }
        SharedCommand::Mkdir { folder, name } => {
            let created = app
                .shared
                .create_folder(&ctx, parse_folder(folder)?, name)
                .await?;
            output::print_success(&format!("Created {} ({})", created.full_path(), created.id));
        }
        SharedCommand::Trash { item } => {
            let count = app.shared.trash(&ctx, item.parse::<ItemId>()?).await?;
            output::print_success(&format!("{} item(s) moved to the trash", count));
        }
        SharedCommand::Cat { file, output } => {
            let download = app.shared.open_file(&ctx, FileId(*file)).await?;
            super::fs::write_download(download, output.as_deref()).await?;
        }
    }

    Ok(())
}

fn parse_folder(raw: &str) -> Result<FolderId, AppError> {
    let raw = raw.strip_prefix("folder:").unwrap_or(raw);
    raw.parse::<FolderId>()
        .map_err(|_| AppError::invalid_argument(format!("Malformed folder id '{raw}'")))
}
