//! Operations a grantee performs inside someone else's tree.
//!
//! Each call passes the [`AccessGate`] first, then invokes the namespace
//! engine with the owner's context. Uploads therefore charge the owner's
//! quota, not the uploader's.

use std::sync::Arc;

use tracing::info;

use cloudnest_auth::{Access, AccessDecision, AccessGate};
use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::{FileId, FolderId, ItemId, UserId};
use cloudnest_database::store::MetadataStore;
use cloudnest_entity::file::File;
use cloudnest_entity::folder::Folder;
use cloudnest_entity::item::{Item, ItemInfo, ItemStatus};
use cloudnest_entity::share::SharePermission;

use crate::context::RequestContext;
use crate::namespace::{FileDownload, NamespaceService};
use crate::request::{CreateFolderRequest, FinalizeUploadRequest};

/// Grantee-facing view of shared folders and files.
#[derive(Debug, Clone)]
pub struct SharedSpaceService {
    store: Arc<dyn MetadataStore>,
    gate: AccessGate,
    namespace: Arc<NamespaceService>,
}

impl SharedSpaceService {
    pub fn new(store: Arc<dyn MetadataStore>, namespace: Arc<NamespaceService>) -> Self {
        Self {
            gate: AccessGate::new(store.clone()),
            store,
            namespace,
        }
    }

    /// Children of a shared folder that the caller can see.
    pub async fn list_folder(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
    ) -> AppResult<Vec<ItemInfo>> {
        let decision = self
            .gate
            .require(ctx.user_id, ItemId::Folder(folder_id), SharePermission::Read)
            .await?;
        let sees_everything = decision.access == Access::Owner;
        let folder = expect_folder(decision)?;
        let dir = folder.full_path();

        let mut tx = self.store.begin().await?;
        let mut entries = Vec::new();
        for child in tx
            .list_folders(folder.owner_id, &dir, ItemStatus::Active)
            .await?
        {
            if sees_everything
                || tx
                    .find_grant(ItemId::Folder(child.id), ctx.user_id)
                    .await?
                    .is_some()
            {
                entries.push(ItemInfo::from(&child));
            }
        }
        for child in tx
            .list_files(folder.owner_id, &dir, ItemStatus::Active)
            .await?
        {
            if sees_everything
                || tx
                    .find_grant(ItemId::File(child.id), ctx.user_id)
                    .await?
                    .is_some()
            {
                entries.push(ItemInfo::from(&child));
            }
        }
        Ok(entries)
    }

    /// Finalize a staged upload into a shared folder. Requires write access.
    pub async fn upload(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        staging_id: &str,
    ) -> AppResult<File> {
        let decision = self
            .gate
            .require(ctx.user_id, ItemId::Folder(folder_id), SharePermission::Write)
            .await?;
        let folder = expect_folder(decision)?;
        let owner = self.owner_context(folder.owner_id).await?;

        let file = self
            .namespace
            .finalize_upload(
                &owner,
                FinalizeUploadRequest {
                    staging_id: staging_id.to_string(),
                    destination_path: folder.full_path(),
                },
            )
            .await?;
        info!(
            actor_id = %ctx.user_id,
            owner_id = %owner.user_id,
            file_id = %file.id,
            "Uploaded into shared folder"
        );
        Ok(file)
    }

    /// Create a folder inside a shared folder. Requires write access.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        parent_id: FolderId,
        name: &str,
    ) -> AppResult<Folder> {
        let decision = self
            .gate
            .require(ctx.user_id, ItemId::Folder(parent_id), SharePermission::Write)
            .await?;
        let parent = expect_folder(decision)?;
        let owner = self.owner_context(parent.owner_id).await?;

        self.namespace
            .create_folder(
                &owner,
                CreateFolderRequest {
                    parent_path: parent.full_path(),
                    name: name.to_string(),
                },
            )
            .await
    }

    /// Trash a shared item. Requires write access.
    pub async fn trash(&self, ctx: &RequestContext, item: ItemId) -> AppResult<usize> {
        let decision = self
            .gate
            .require(ctx.user_id, item, SharePermission::Write)
            .await?;
        let owner = self.owner_context(decision.item.owner_id()).await?;
        let count = self.namespace.trash_by_ids(&owner, &[item]).await?;
        info!(actor_id = %ctx.user_id, owner_id = %owner.user_id, item = %item, "Trashed shared item");
        Ok(count)
    }

    /// Open a shared file for reading. Requires read access.
    pub async fn open_file(&self, ctx: &RequestContext, file_id: FileId) -> AppResult<FileDownload> {
        let decision = self
            .gate
            .require(ctx.user_id, ItemId::File(file_id), SharePermission::Read)
            .await?;
        let Item::File(file) = decision.item else {
            return Err(AppError::invalid_argument(format!("{file_id} is not a file")));
        };
        let owner = self.owner_context(file.owner_id).await?;
        self.namespace.open_file(&owner, &file.full_path()).await
    }

    async fn owner_context(&self, owner_id: UserId) -> AppResult<RequestContext> {
        let mut tx = self.store.begin().await?;
        let owner = tx
            .find_user(owner_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Owner {owner_id} not found")))?;
        Ok(RequestContext::from(&owner))
    }
}

fn expect_folder(decision: AccessDecision) -> AppResult<Folder> {
    match decision.item {
        Item::Folder(folder) => Ok(folder),
        Item::File(file) => Err(AppError::invalid_argument(format!(
            "'{}' is not a folder",
            file.name
        ))),
    }
}
