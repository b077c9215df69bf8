//! Trash lifecycle: trash, restore and trash-by-id batches.
//!
//! A batch runs in one transaction; the first failing entry aborts it and
//! nothing is changed. Status toggles touch metadata only.

use std::collections::HashSet;

use tracing::info;

use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::path;
use cloudnest_core::types::ItemId;
use cloudnest_entity::item::ItemStatus;

use super::{NamespaceService, split_item_path};
use crate::context::RequestContext;

impl NamespaceService {
    /// Move every item named by `paths` to the trash.
    ///
    /// A path matches an active file and an active folder independently;
    /// both are trashed when both exist. Returns the number of rows toggled.
    pub async fn trash(&self, ctx: &RequestContext, paths: &[String]) -> AppResult<usize> {
        let mut tx = self.store.begin().await?;
        tx.lock_user(ctx.user_id).await?;

        let mut toggled = 0;
        let mut seen = HashSet::new();
        for raw in paths {
            let logical = path::normalize(raw)?;
            if !seen.insert(logical.clone()) {
                continue;
            }
            let (parent, name) = split_item_path(&logical)?;

            let file = tx
                .find_file(ctx.user_id, parent, name, ItemStatus::Active)
                .await?;
            let folder = tx
                .find_folder(ctx.user_id, parent, name, ItemStatus::Active)
                .await?;
            if file.is_none() && folder.is_none() {
                return Err(AppError::not_found(format!(
                    "No file or folder at '{logical}'"
                )));
            }
            if let Some(file) = file {
                tx.set_file_status(file.id, ItemStatus::Trashed).await?;
                toggled += 1;
            }
            if let Some(folder) = folder {
                tx.set_folder_status(folder.id, ItemStatus::Trashed).await?;
                toggled += 1;
            }
        }
        tx.commit().await?;

        info!(owner_id = %ctx.user_id, paths = paths.len(), toggled, "Items trashed");
        Ok(toggled)
    }

    /// Restore the most recently trashed item(s) at each of `paths`.
    ///
    /// Restoring onto a path that already holds an active sibling of the same
    /// kind is a `Conflict` and aborts the batch.
    pub async fn restore(&self, ctx: &RequestContext, paths: &[String]) -> AppResult<usize> {
        let mut tx = self.store.begin().await?;
        tx.lock_user(ctx.user_id).await?;

        let mut toggled = 0;
        let mut seen = HashSet::new();
        for raw in paths {
            let logical = path::normalize(raw)?;
            if !seen.insert(logical.clone()) {
                continue;
            }
            let (parent, name) = split_item_path(&logical)?;

            let file = tx
                .find_file(ctx.user_id, parent, name, ItemStatus::Trashed)
                .await?;
            let folder = tx
                .find_folder(ctx.user_id, parent, name, ItemStatus::Trashed)
                .await?;
            if file.is_none() && folder.is_none() {
                return Err(AppError::not_found(format!(
                    "Nothing named '{logical}' in the trash"
                )));
            }

            if let Some(file) = file {
                if tx
                    .find_file(ctx.user_id, parent, name, ItemStatus::Active)
                    .await?
                    .is_some()
                {
                    return Err(AppError::conflict(format!(
                        "Cannot restore '{logical}': an active file has that name"
                    )));
                }
                tx.set_file_status(file.id, ItemStatus::Active).await?;
                toggled += 1;
            }
            if let Some(folder) = folder {
                if tx
                    .find_folder(ctx.user_id, parent, name, ItemStatus::Active)
                    .await?
                    .is_some()
                {
                    return Err(AppError::conflict(format!(
                        "Cannot restore '{logical}': an active folder has that name"
                    )));
                }
                tx.set_folder_status(folder.id, ItemStatus::Active).await?;
                toggled += 1;
            }
        }
        tx.commit().await?;

        info!(owner_id = %ctx.user_id, paths = paths.len(), toggled, "Items restored");
        Ok(toggled)
    }

    /// Trash items by ID. Every item must be active and owned by the caller.
    pub async fn trash_by_ids(&self, ctx: &RequestContext, ids: &[ItemId]) -> AppResult<usize> {
        let mut tx = self.store.begin().await?;
        tx.lock_user(ctx.user_id).await?;

        let mut seen = HashSet::new();
        for id in ids {
            if !seen.insert(*id) {
                continue;
            }
            let owned_and_active = match id {
                ItemId::File(file_id) => tx
                    .find_file_by_id(*file_id)
                    .await?
                    .is_some_and(|f| f.owner_id == ctx.user_id && f.is_active()),
                ItemId::Folder(folder_id) => tx
                    .find_folder_by_id(*folder_id)
                    .await?
                    .is_some_and(|f| f.owner_id == ctx.user_id && f.is_active()),
            };
            if !owned_and_active {
                return Err(AppError::not_found(format!("Item {id} not found")));
            }
            match id {
                ItemId::File(file_id) => tx.set_file_status(*file_id, ItemStatus::Trashed).await?,
                ItemId::Folder(folder_id) => {
                    tx.set_folder_status(*folder_id, ItemStatus::Trashed)
                        .await?
                }
            }
        }
        tx.commit().await?;

        info!(owner_id = %ctx.user_id, count = seen.len(), "Items trashed by id");
        Ok(seen.len())
    }
}
