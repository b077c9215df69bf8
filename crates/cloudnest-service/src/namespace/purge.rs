//! Permanent deletion of trashed items.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::path;
use cloudnest_core::types::{ItemId, UserId};
use cloudnest_database::store::MetadataTx;
use cloudnest_entity::file::File;
use cloudnest_entity::folder::Folder;
use cloudnest_entity::item::ItemStatus;
use cloudnest_storage::layout;

use super::{NamespaceService, split_item_path};
use crate::context::RequestContext;

/// What a purge removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub files_removed: usize,
    pub folders_removed: usize,
    pub bytes_freed: i64,
    /// Blobs or directories that could not be unlinked after commit.
    pub orphans: Vec<String>,
}

impl NamespaceService {
    /// Permanently delete the trashed item at `logical`.
    ///
    /// A trashed file shadows a trashed folder of the same name. Purging an
    /// item that is only active is a `Conflict`; a path with no rows at all
    /// is `NotFound`.
    pub async fn permanently_delete(
        &self,
        ctx: &RequestContext,
        logical: &str,
    ) -> AppResult<PurgeReport> {
        let target = path::normalize(logical)?;
        let (parent, name) = split_item_path(&target)?;

        let mut report = PurgeReport::default();
        let mut blobs = Vec::new();
        let mut dir = None;
        {
            let mut tx = self.store.begin().await?;
            tx.lock_user(ctx.user_id).await?;

            if let Some(file) = tx
                .find_file(ctx.user_id, parent, name, ItemStatus::Trashed)
                .await?
            {
                blobs.push(layout::blob_path(&ctx.username, &file.parent_path, file.id)?);
                remove_file(tx.as_mut(), &file).await?;
                report.files_removed = 1;
                report.bytes_freed = file.size_bytes;
            } else if let Some(folder) = tx
                .find_folder(ctx.user_id, parent, name, ItemStatus::Trashed)
                .await?
            {
                // The subtree is found by path, so it must belong to this
                // folder alone.
                if tx.count_folders_at(ctx.user_id, parent, name).await? > 1 {
                    return Err(AppError::conflict(format!(
                        "Another folder also occupies '{target}'; restore or remove it first"
                    )));
                }

                let (files, folders) = collect_subtree(tx.as_mut(), ctx.user_id, &target).await?;
                for file in &files {
                    blobs.push(layout::blob_path(&ctx.username, &file.parent_path, file.id)?);
                    remove_file(tx.as_mut(), file).await?;
                    report.bytes_freed += file.size_bytes;
                }
                for descendant in folders.iter().rev() {
                    remove_folder(tx.as_mut(), descendant).await?;
                }
                remove_folder(tx.as_mut(), &folder).await?;

                report.files_removed = files.len();
                report.folders_removed = folders.len() + 1;
                dir = Some(layout::folder_dir(&ctx.username, &target)?);
            } else if super::find_item_at(tx.as_mut(), ctx.user_id, &target, ItemStatus::Active)
                .await?
                .is_some()
            {
                return Err(AppError::conflict(format!(
                    "'{target}' must be trashed before it can be deleted permanently"
                )));
            } else {
                return Err(AppError::not_found(format!(
                    "Nothing named '{target}' in the trash"
                )));
            }

            tx.commit().await?;
        }

        // Metadata is gone; leftovers on disk are only logged.
        for blob in blobs {
            if let Err(e) = self.storage.delete(&blob).await {
                warn!(owner_id = %ctx.user_id, blob = %blob, error = %e, "Orphaned blob after purge");
                report.orphans.push(blob);
            }
        }
        if let Some(dir) = dir {
            if let Err(e) = self.storage.delete_dir(&dir).await {
                warn!(owner_id = %ctx.user_id, dir = %dir, error = %e, "Orphaned directory after purge");
                report.orphans.push(dir);
            }
        }

        info!(
            owner_id = %ctx.user_id,
            path = %target,
            files = report.files_removed,
            folders = report.folders_removed,
            bytes = report.bytes_freed,
            "Item permanently deleted"
        );
        Ok(report)
    }
}

async fn remove_file(tx: &mut dyn MetadataTx, file: &File) -> AppResult<()> {
    tx.delete_grants_for(ItemId::File(file.id)).await?;
    tx.delete_file(file.id).await?;
    tx.adjust_quota_used(file.owner_id, -file.size_bytes).await?;
    Ok(())
}

async fn remove_folder(tx: &mut dyn MetadataTx, folder: &Folder) -> AppResult<()> {
    tx.delete_grants_for(ItemId::Folder(folder.id)).await?;
    tx.delete_folder(folder.id).await?;
    Ok(())
}

/// Depth-first walk below `root`, in any status.
///
/// Returns every descendant file and every descendant folder, folders in
/// discovery order (parents before children). A path is expanded at most
/// once, so a malformed parent chain cannot loop.
async fn collect_subtree(
    tx: &mut dyn MetadataTx,
    owner: UserId,
    root: &str,
) -> AppResult<(Vec<File>, Vec<Folder>)> {
    let mut files = Vec::new();
    let mut folders = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![root.to_string()];

    while let Some(dir) = stack.pop() {
        if !visited.insert(dir.clone()) {
            debug!(owner_id = %owner, path = %dir, "Path already expanded");
            continue;
        }
        for status in [ItemStatus::Active, ItemStatus::Trashed] {
            files.extend(tx.list_files(owner, &dir, status).await?);
            for folder in tx.list_folders(owner, &dir, status).await? {
                stack.push(folder.full_path());
                folders.push(folder);
            }
        }
    }
    Ok((files, folders))
}
