//! Archive builder.
//!
//! Entries are planned from metadata first, in one read transaction, and
//! then written by streaming each blob from the physical store. A folder's
//! directory entry always precedes its children, and entry names are
//! relative to the outermost requested item.

use std::collections::HashSet;
use std::io::{Cursor, Seek, Write};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Datelike, Timelike, Utc};
use futures::StreamExt;
use serde::Serialize;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use cloudnest_core::config::ArchiveConfig;
use cloudnest_core::error::{AppError, ErrorKind};
use cloudnest_core::result::AppResult;
use cloudnest_core::traits::StorageProvider;
use cloudnest_core::types::path;
use cloudnest_core::types::UserId;
use cloudnest_database::store::{MetadataStore, MetadataTx};
use cloudnest_entity::item::{Item, ItemStatus};
use cloudnest_storage::layout;

use super::naming;
use crate::context::RequestContext;
use crate::namespace::find_item_at;

/// What ended up in an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveSummary {
    pub files: usize,
    pub folders: usize,
    pub bytes: u64,
    /// Requested paths or entries that were left out.
    pub skipped: Vec<String>,
}

/// A fully built in-memory archive.
#[derive(Debug, Clone)]
pub struct Archive {
    pub file_name: String,
    pub content_type: &'static str,
    pub content_disposition: String,
    pub bytes: Bytes,
    pub summary: ArchiveSummary,
}

#[derive(Debug)]
enum Entry {
    Directory {
        name: String,
        modified_at: DateTime<Utc>,
    },
    File {
        name: String,
        blob: String,
        modified_at: DateTime<Utc>,
    },
}

/// Builds zip archives of an owner's items.
#[derive(Debug, Clone)]
pub struct ArchiveService {
    store: Arc<dyn MetadataStore>,
    storage: Arc<dyn StorageProvider>,
    config: ArchiveConfig,
}

impl ArchiveService {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        storage: Arc<dyn StorageProvider>,
        config: ArchiveConfig,
    ) -> Self {
        Self {
            store,
            storage,
            config,
        }
    }

    /// File name to offer for an archive of `paths`.
    pub fn archive_name(&self, paths: &[String]) -> String {
        naming::archive_name(paths, &self.config.bulk_name_prefix, Utc::now())
    }

    /// Build the archive in memory.
    pub async fn build(&self, ctx: &RequestContext, paths: &[String]) -> AppResult<Archive> {
        let (cursor, summary) = self
            .write_archive(ctx, paths, Cursor::new(Vec::new()))
            .await?;
        let file_name = self.archive_name(paths);
        Ok(Archive {
            content_disposition: naming::content_disposition(&file_name),
            file_name,
            content_type: "application/zip",
            bytes: Bytes::from(cursor.into_inner()),
            summary,
        })
    }

    /// Write the archive of `paths` into `writer` and hand the writer back.
    ///
    /// Paths that resolve to nothing and blobs that cannot be read are
    /// logged and skipped. Fails with `NotFound` only if no requested path
    /// resolved at all.
    pub async fn write_archive<W>(
        &self,
        ctx: &RequestContext,
        paths: &[String],
        writer: W,
    ) -> AppResult<(W, ArchiveSummary)>
    where
        W: Write + Seek + Send,
    {
        let mut summary = ArchiveSummary::default();
        let entries = {
            let mut tx = self.store.begin().await?;
            plan(tx.as_mut(), ctx, paths, &mut summary).await?
        };
        if entries.is_empty() && !summary.skipped.is_empty() {
            return Err(AppError::not_found("None of the requested items exist"));
        }

        let mut zip = ZipWriter::new(writer);

        for entry in entries {
            match entry {
                Entry::Directory { name, modified_at } => {
                    zip.add_directory(name.as_str(), entry_options(modified_at))
                        .map_err(|e| zip_error("add directory", e))?;
                    summary.folders += 1;
                }
                Entry::File {
                    name,
                    blob,
                    modified_at,
                } => {
                    let mut stream = match self.storage.read(&blob).await {
                        Ok(stream) => stream,
                        Err(e) => {
                            warn!(entry = %name, blob = %blob, error = %e, "Skipping unreadable archive entry");
                            summary.skipped.push(name);
                            continue;
                        }
                    };

                    zip.start_file(name.as_str(), entry_options(modified_at))
                        .map_err(|e| zip_error("start entry", e))?;
                    let mut written = 0u64;
                    let mut complete = true;
                    while let Some(chunk) = stream.next().await {
                        match chunk {
                            Ok(data) => {
                                zip.write_all(&data).map_err(|e| {
                                    AppError::with_source(
                                        ErrorKind::Internal,
                                        "Failed to write archive entry",
                                        e,
                                    )
                                })?;
                                written += data.len() as u64;
                            }
                            Err(e) => {
                                warn!(entry = %name, error = %e, "Dropping archive entry after read error");
                                complete = false;
                                break;
                            }
                        }
                    }

                    if complete {
                        summary.bytes += written;
                        summary.files += 1;
                    } else {
                        // Rewind past the partial entry so it never reaches
                        // the central directory.
                        zip.abort_file()
                            .map_err(|e| zip_error("drop partial entry", e))?;
                        summary.skipped.push(name);
                    }
                }
            }
        }

        let writer = zip.finish().map_err(|e| zip_error("finish archive", e))?;
        info!(
            owner_id = %ctx.user_id,
            files = summary.files,
            folders = summary.folders,
            skipped = summary.skipped.len(),
            "Archive built"
        );
        Ok((writer, summary))
    }
}

/// Resolve requested paths into an ordered entry list.
async fn plan(
    tx: &mut dyn MetadataTx,
    ctx: &RequestContext,
    paths: &[String],
    summary: &mut ArchiveSummary,
) -> AppResult<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut names = HashSet::new();

    for raw in paths {
        let logical = path::normalize(raw)?;
        if path::is_root(&logical) {
            walk(tx, ctx, &logical, "", &mut entries, &mut names, summary).await?;
            continue;
        }

        match find_item_at(tx, ctx.user_id, &logical, ItemStatus::Active).await? {
            Some(Item::File(file)) => {
                let blob = layout::blob_path(&ctx.username, &file.parent_path, file.id)?;
                push(
                    &mut entries,
                    &mut names,
                    summary,
                    Entry::File {
                        name: file.name.clone(),
                        blob,
                        modified_at: file.modified_at,
                    },
                );
            }
            Some(Item::Folder(folder)) => {
                let prefix = format!("{}/", folder.name);
                push(
                    &mut entries,
                    &mut names,
                    summary,
                    Entry::Directory {
                        name: prefix.clone(),
                        modified_at: folder.modified_at,
                    },
                );
                walk(tx, ctx, &logical, &prefix, &mut entries, &mut names, summary).await?;
            }
            None => {
                warn!(owner_id = %ctx.user_id, path = %logical, "Requested archive item not found");
                summary.skipped.push(logical);
            }
        }
    }
    Ok(entries)
}

/// Depth-first walk of the active contents of `root`.
async fn walk(
    tx: &mut dyn MetadataTx,
    ctx: &RequestContext,
    root: &str,
    prefix: &str,
    entries: &mut Vec<Entry>,
    names: &mut HashSet<String>,
    summary: &mut ArchiveSummary,
) -> AppResult<()> {
    let owner: UserId = ctx.user_id;
    let mut visited = HashSet::new();
    let mut stack = vec![(root.to_string(), prefix.to_string())];

    while let Some((dir, prefix)) = stack.pop() {
        if !visited.insert(dir.clone()) {
            continue;
        }
        for file in tx.list_files(owner, &dir, ItemStatus::Active).await? {
            let blob = layout::blob_path(&ctx.username, &file.parent_path, file.id)?;
            push(
                entries,
                names,
                summary,
                Entry::File {
                    name: format!("{prefix}{}", file.name),
                    blob,
                    modified_at: file.modified_at,
                },
            );
        }

        let folders = tx.list_folders(owner, &dir, ItemStatus::Active).await?;
        let mut children = Vec::with_capacity(folders.len());
        for folder in folders {
            let child_prefix = format!("{prefix}{}/", folder.name);
            push(
                entries,
                names,
                summary,
                Entry::Directory {
                    name: child_prefix.clone(),
                    modified_at: folder.modified_at,
                },
            );
            children.push((folder.full_path(), child_prefix));
        }
        // Reverse so subfolders are expanded in listing order.
        stack.extend(children.into_iter().rev());
    }
    Ok(())
}

fn push(
    entries: &mut Vec<Entry>,
    names: &mut HashSet<String>,
    summary: &mut ArchiveSummary,
    entry: Entry,
) {
    let name = match &entry {
        Entry::Directory { name, .. } | Entry::File { name, .. } => name.clone(),
    };
    if names.insert(name.clone()) {
        entries.push(entry);
    } else {
        warn!(entry = %name, "Duplicate archive entry skipped");
        summary.skipped.push(name);
    }
}

fn entry_options(modified_at: DateTime<Utc>) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip_time(modified_at))
}

/// Zip timestamps have two-second resolution and start in 1980.
fn zip_time(at: DateTime<Utc>) -> zip::DateTime {
    zip::DateTime::from_date_and_time(
        u16::try_from(at.year()).unwrap_or(1980),
        at.month() as u8,
        at.day() as u8,
        at.hour() as u8,
        at.minute() as u8,
        at.second() as u8,
    )
    .unwrap_or_default()
}

fn zip_error(what: &str, e: zip::result::ZipError) -> AppError {
    AppError::with_source(ErrorKind::Internal, format!("Failed to {what}"), e)
}
