//! Commands on the acting user's own tree.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use clap::{Args, Subcommand};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use cloudnest_core::config::AppConfig;
use cloudnest_core::error::AppError;
use cloudnest_core::types::path;
use cloudnest_entity::item::ItemInfo;
use cloudnest_service::FileDownload;
use cloudnest_service::request::{CreateFolderRequest, FinalizeUploadRequest, MoveItemRequest};

use crate::app::App;
use crate::output::{self, OutputFormat};

/// Arguments for fs commands
#[derive(Debug, Args)]
pub struct FsArgs {
    /// Fs subcommand
    #[command(subcommand)]
    pub command: FsCommand,
}

/// Fs subcommands
#[derive(Debug, Subcommand)]
pub enum FsCommand {
    /// List a folder
    Ls {
        /// Logical path
        #[arg(default_value = "/")]
        path: String,
    },
    /// Create a folder
    Mkdir {
        /// Logical path of the new folder
        path: String,
        /// Create missing parent folders as well
        #[arg(short, long)]
        parents: bool,
    },
    /// Copy a local file into the staging area and finalize it into a folder
    Upload {
        /// Local file to upload
        file: PathBuf,
        /// Destination folder
        #[arg(default_value = "/")]
        destination: String,
        /// Staging id to use (defaults to one derived from the file name)
        #[arg(long)]
        id: Option<String>,
    },
    /// Finalize an upload already present in the staging area
    Finalize {
        /// Staging id left by the upload collaborator
        staging_id: String,
        /// Destination folder
        #[arg(default_value = "/")]
        destination: String,
    },
    /// Move an item into another folder
    Mv {
        /// Item to move
        source: String,
        /// Destination folder
        destination: String,
    },
    /// Rename an item in place
    Rename {
        /// Item to rename
        path: String,
        /// New name
        new_name: String,
    },
    /// Write a file's content to stdout or a local file
    Cat {
        /// Logical path of the file
        path: String,
        /// Write to this local file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show your quota
    Quota,
}

/// Execute fs commands
pub async fn execute(
    args: &FsArgs,
    config: &AppConfig,
    acting: Option<&str>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let app = App::build(config).await?;
    let ctx = app.act_as(acting).await?;

    match &args.command {
        FsCommand::Ls { path } => {
            let entries = app.namespace.list(&ctx, path).await?;
            output::print_entries(&entries, format);
        }
        FsCommand::Mkdir { path: target, parents } => {
            if *parents {
                let created = app.namespace.create_folder_path(&ctx, target).await?;
                let rows: Vec<ItemInfo> = created.iter().map(ItemInfo::from).collect();
                output::print_entries(&rows, format);
                output::print_success(&format!("{} folder(s) created", created.len()));
            } else {
                let logical = path::normalize(target)?;
                let (parent, name) = path::split(&logical)
                    .ok_or_else(|| AppError::invalid_argument("The root folder always exists"))?;
                let folder = app
                    .namespace
                    .create_folder(
                        &ctx,
                        CreateFolderRequest {
                            parent_path: parent.to_string(),
                            name: name.to_string(),
                        },
                    )
                    .await?;
                output::print_success(&format!("Created {} ({})", folder.full_path(), folder.id));
            }
        }
        FsCommand::Upload {
            file,
            destination,
            id,
        } => {
            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| AppError::invalid_argument("Upload source has no file name"))?;
            let staging_id = id.clone().unwrap_or_else(|| staging_id_for(&ctx.username, filename));
            let data = tokio::fs::read(file).await?;
            app.staging
                .deposit(&staging_id, Bytes::from(data), filename, None)
                .await?;
            finalize(&app, &ctx, staging_id, destination).await?;
        }
        FsCommand::Finalize {
            staging_id,
            destination,
        } => {
            finalize(&app, &ctx, staging_id.clone(), destination).await?;
        }
        FsCommand::Mv {
            source,
            destination,
        } => {
            let item = app
                .namespace
                .move_item(
                    &ctx,
                    MoveItemRequest {
                        source_path: source.clone(),
                        destination_folder: destination.clone(),
                    },
                )
                .await?;
            output::print_success(&format!("Moved to {}", item.full_path()));
        }
        FsCommand::Rename { path, new_name } => {
            let item = app.namespace.rename_item(&ctx, path, new_name).await?;
            output::print_success(&format!("Renamed to {}", item.full_path()));
        }
        FsCommand::Cat { path, output } => {
            let download = app.namespace.open_file(&ctx, path).await?;
            write_download(download, output.as_deref()).await?;
        }
        FsCommand::Quota => {
            let quota = app.namespace.quota(&ctx).await?;
            super::user::print_quota(&ctx.username, &quota, format);
        }
    }

    Ok(())
}

async fn finalize(
    app: &App,
    ctx: &cloudnest_service::RequestContext,
    staging_id: String,
    destination: &str,
) -> Result<(), AppError> {
    let file = app
        .namespace
        .finalize_upload(
            ctx,
            FinalizeUploadRequest {
                staging_id,
                destination_path: destination.to_string(),
            },
        )
        .await?;
    output::print_success(&format!(
        "Stored {} ({}, {})",
        file.full_path(),
        file.id,
        output::human_bytes(file.size_bytes)
    ));
    Ok(())
}

/// Stream an open file to `target`, or to stdout.
pub async fn write_download(
    download: FileDownload,
    target: Option<&Path>,
) -> Result<u64, AppError> {
    let mut stream = download.stream;
    let mut written = 0u64;
    match target {
        Some(target) => {
            let mut out = tokio::fs::File::create(target).await?;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                out.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            out.flush().await?;
            output::print_success(&format!(
                "Wrote {} ({}) to {}",
                download.file.name,
                output::human_bytes(written as i64),
                target.display()
            ));
        }
        None => {
            let mut out = tokio::io::stdout();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                out.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            out.flush().await?;
        }
    }
    Ok(written)
}

/// Staging ids may only hold `[A-Za-z0-9_+-]`.
fn staging_id_for(username: &str, filename: &str) -> String {
    format!("cli-{username}-{filename}")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
