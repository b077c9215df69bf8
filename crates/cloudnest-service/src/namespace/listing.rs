//! Read-only namespace queries.

use tracing::debug;

use cloudnest_core::error::{AppError, ErrorKind};
use cloudnest_core::result::AppResult;
use cloudnest_core::traits::ByteStream;
use cloudnest_core::types::path;
use cloudnest_entity::file::{DEFAULT_MIME_TYPE, File};
use cloudnest_entity::item::{ItemInfo, ItemStatus};
use cloudnest_entity::user::QuotaInfo;
use cloudnest_storage::layout;

use super::{NamespaceService, require_folder};
use crate::context::RequestContext;

/// An open file: its row plus a stream over its bytes.
pub struct FileDownload {
    pub file: File,
    pub content_type: String,
    pub stream: ByteStream,
}

impl std::fmt::Debug for FileDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDownload")
            .field("file", &self.file)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl NamespaceService {
    /// Active folders then active files directly under `logical`, in
    /// insertion order.
    pub async fn list(&self, ctx: &RequestContext, logical: &str) -> AppResult<Vec<ItemInfo>> {
        let dir = path::normalize(logical)?;
        let mut tx = self.store.begin().await?;
        require_folder(tx.as_mut(), ctx.user_id, &dir).await?;

        let folders = tx
            .list_folders(ctx.user_id, &dir, ItemStatus::Active)
            .await?;
        let files = tx.list_files(ctx.user_id, &dir, ItemStatus::Active).await?;

        let mut entries: Vec<ItemInfo> = folders.iter().map(ItemInfo::from).collect();
        entries.extend(files.iter().map(ItemInfo::from));
        debug!(owner_id = %ctx.user_id, path = %dir, count = entries.len(), "Listed folder");
        Ok(entries)
    }

    /// Every trashed folder and file of the owner.
    pub async fn list_trash(&self, ctx: &RequestContext) -> AppResult<Vec<ItemInfo>> {
        let mut tx = self.store.begin().await?;
        let folders = tx
            .list_folders_with_status(ctx.user_id, ItemStatus::Trashed)
            .await?;
        let files = tx
            .list_files_with_status(ctx.user_id, ItemStatus::Trashed)
            .await?;

        let mut entries: Vec<ItemInfo> = folders.iter().map(ItemInfo::from).collect();
        entries.extend(files.iter().map(ItemInfo::from));
        Ok(entries)
    }

    /// Quota of the owner.
    pub async fn quota(&self, ctx: &RequestContext) -> AppResult<QuotaInfo> {
        let mut tx = self.store.begin().await?;
        let user = tx
            .find_user(ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_authenticated("Unknown user"))?;
        Ok(user.quota())
    }

    /// Open an active file for reading.
    pub async fn open_file(&self, ctx: &RequestContext, logical: &str) -> AppResult<FileDownload> {
        let target = path::normalize(logical)?;
        let (parent, name) = super::split_item_path(&target)?;

        let file = {
            let mut tx = self.store.begin().await?;
            tx.find_file(ctx.user_id, parent, name, ItemStatus::Active)
                .await?
                .ok_or_else(|| AppError::not_found(format!("File '{target}' not found")))?
        };

        let blob = layout::blob_path(&ctx.username, &file.parent_path, file.id)?;
        let stream = self.storage.read(&blob).await.map_err(|e| match e.kind {
            ErrorKind::NotFound => AppError::with_source(
                ErrorKind::NotFound,
                format!("Content of '{target}' is not available"),
                e,
            ),
            _ => e,
        })?;

        let content_type = if file.mime_type.trim().is_empty() {
            DEFAULT_MIME_TYPE.to_string()
        } else {
            file.mime_type.clone()
        };
        Ok(FileDownload {
            content_type,
            file,
            stream,
        })
    }
}
