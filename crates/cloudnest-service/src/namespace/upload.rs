//! Upload finalization: staged blob to file row plus placed bytes.

use tracing::info;

use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::path;
use cloudnest_core::types::ItemId;
use cloudnest_entity::file::{File, NewFile};
use cloudnest_entity::item::ItemStatus;
use cloudnest_storage::layout;

use super::{NamespaceService, require_folder};
use crate::context::RequestContext;
use crate::request::{FinalizeUploadRequest, validate_request};
use crate::saga::{Compensation, Saga};
use crate::share::inherit::inherit_grants;

impl NamespaceService {
    /// Turn a completed staged upload into a file in `destination_path`.
    ///
    /// Quota is charged to the owner in the same transaction that inserts the
    /// row. The blob is moved into place only after commit; if that fails the
    /// row is removed and the quota given back.
    pub async fn finalize_upload(
        &self,
        ctx: &RequestContext,
        req: FinalizeUploadRequest,
    ) -> AppResult<File> {
        validate_request(&req)?;
        let destination = path::normalize(&req.destination_path)?;
        let staged = self.staging.load(&req.staging_id).await?;
        path::validate_name(&staged.filename)?;

        let mut saga = Saga::new("finalize_upload");
        let file = {
            let mut tx = self.store.begin().await?;
            let owner = tx.lock_user(ctx.user_id).await?;
            require_folder(tx.as_mut(), ctx.user_id, &destination).await?;

            let quota = owner.quota();
            if quota.would_exceed(staged.size_bytes) {
                return Err(AppError::quota_exceeded(format!(
                    "Uploading {} bytes would exceed the quota ({} of {} bytes used)",
                    staged.size_bytes, quota.used_bytes, quota.limit_bytes
                )));
            }
            if tx
                .find_file(ctx.user_id, &destination, &staged.filename, ItemStatus::Active)
                .await?
                .is_some()
            {
                return Err(AppError::conflict(format!(
                    "File '{}' already exists",
                    path::join(&destination, &staged.filename)
                )));
            }

            let file = tx
                .insert_file(&NewFile {
                    owner_id: ctx.user_id,
                    name: staged.filename.clone(),
                    mime_type: staged.mime_type.clone(),
                    size_bytes: staged.size_bytes,
                    parent_path: destination.clone(),
                })
                .await?;
            tx.adjust_quota_used(ctx.user_id, staged.size_bytes).await?;
            inherit_grants(tx.as_mut(), ctx.user_id, &destination, ItemId::File(file.id)).await?;
            saga.record(Compensation::RemoveFile {
                owner_id: ctx.user_id,
                file_id: file.id,
                size_bytes: staged.size_bytes,
            });
            tx.commit().await?;
            file
        };

        let target = match layout::blob_path(&ctx.username, &destination, file.id) {
            Ok(target) => target,
            Err(e) => return Err(saga.abort(self.store.as_ref(), e).await),
        };
        if let Err(e) = self.storage.rename(&staged.blob_path, &target).await {
            return Err(saga.abort(self.store.as_ref(), e).await);
        }
        self.staging.discard_record(&req.staging_id).await;

        info!(
            owner_id = %ctx.user_id,
            file_id = %file.id,
            path = %file.full_path(),
            size = file.size_bytes,
            "Upload finalized"
        );
        Ok(file)
    }
}
