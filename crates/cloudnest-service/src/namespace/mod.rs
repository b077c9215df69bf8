//! Namespace engine: the path-addressed tree of one owner.
//!
//! Operations take the owner's [`RequestContext`] explicitly. Every mutating
//! operation locks the owner's user row first so that concurrent writers of
//! the same tree are serialized by the metadata store.

pub mod create;
pub mod listing;
pub mod purge;
pub mod relocate;
pub mod trash;
pub mod upload;

use std::sync::Arc;

use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::traits::StorageProvider;
use cloudnest_core::types::path;
use cloudnest_core::types::UserId;
use cloudnest_database::store::{MetadataStore, MetadataTx};
use cloudnest_entity::folder::Folder;
use cloudnest_entity::item::{Item, ItemStatus};
use cloudnest_storage::StagingArea;

pub use listing::FileDownload;
pub use purge::PurgeReport;

/// The namespace engine.
#[derive(Debug, Clone)]
pub struct NamespaceService {
    /// Metadata store (source of truth).
    store: Arc<dyn MetadataStore>,
    /// Physical blob storage.
    storage: Arc<dyn StorageProvider>,
    /// Where the upload collaborator deposits completed uploads.
    staging: StagingArea,
}

impl NamespaceService {
    /// Creates a new namespace service.
    pub fn new(
        store: Arc<dyn MetadataStore>,
        storage: Arc<dyn StorageProvider>,
        staging: StagingArea,
    ) -> Self {
        Self {
            store,
            storage,
            staging,
        }
    }

    pub fn store(&self) -> &Arc<dyn MetadataStore> {
        &self.store
    }

    pub fn storage(&self) -> &Arc<dyn StorageProvider> {
        &self.storage
    }
}

/// Resolve a canonical path to an item with the given status.
///
/// Files are checked before folders, so a file shadows a same-named folder.
/// The root is not an item and resolves to `None`.
pub(crate) async fn find_item_at(
    tx: &mut dyn MetadataTx,
    owner: UserId,
    logical: &str,
    status: ItemStatus,
) -> AppResult<Option<Item>> {
    let Some((parent, name)) = path::split(logical) else {
        return Ok(None);
    };
    if let Some(file) = tx.find_file(owner, parent, name, status).await? {
        return Ok(Some(Item::File(file)));
    }
    Ok(tx
        .find_folder(owner, parent, name, status)
        .await?
        .map(Item::Folder))
}

/// Require `logical` to be the root or an active folder of `owner`.
pub(crate) async fn require_folder(
    tx: &mut dyn MetadataTx,
    owner: UserId,
    logical: &str,
) -> AppResult<Option<Folder>> {
    let Some((parent, name)) = path::split(logical) else {
        return Ok(None);
    };
    tx.find_folder(owner, parent, name, ItemStatus::Active)
        .await?
        .map(Some)
        .ok_or_else(|| AppError::not_found(format!("Folder '{logical}' not found")))
}

/// Require that no folder row of `owner`, active or trashed, sits at
/// `parent/name`.
///
/// A trashed folder keeps its directory on disk and its descendants keep
/// their paths, so its location stays taken until it is restored or purged.
pub(crate) async fn require_free_folder_slot(
    tx: &mut dyn MetadataTx,
    owner: UserId,
    parent: &str,
    name: &str,
) -> AppResult<()> {
    let full = path::join(parent, name);
    if tx
        .find_folder(owner, parent, name, ItemStatus::Active)
        .await?
        .is_some()
    {
        return Err(AppError::conflict(format!("Folder '{full}' already exists")));
    }
    if tx.count_folders_at(owner, parent, name).await? > 0 {
        return Err(AppError::conflict(format!(
            "A trashed folder still holds '{full}'; restore or purge it first"
        )));
    }
    Ok(())
}

/// Split a canonical non-root path, rejecting the root itself.
pub(crate) fn split_item_path(logical: &str) -> AppResult<(&str, &str)> {
    path::split(logical)
        .ok_or_else(|| AppError::invalid_argument("The root folder cannot be used here"))
}
