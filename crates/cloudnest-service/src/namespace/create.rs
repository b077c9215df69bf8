//! Folder creation.

use tracing::info;

use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::path;
use cloudnest_core::types::ItemId;
use cloudnest_entity::folder::{Folder, NewFolder};
use cloudnest_entity::item::ItemStatus;
use cloudnest_storage::layout;

use super::{NamespaceService, require_folder, require_free_folder_slot};
use crate::context::RequestContext;
use crate::request::{CreateFolderRequest, validate_request};
use crate::saga::{Compensation, Saga};
use crate::share::inherit::inherit_grants;

impl NamespaceService {
    /// Create a single folder under an existing parent.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<Folder> {
        validate_request(&req)?;
        layout::validate_folder_name(&req.name)?;
        let parent = path::normalize(&req.parent_path)?;
        let full = path::join(&parent, &req.name);
        let physical = layout::folder_dir(&ctx.username, &full)?;

        let mut saga = Saga::new("create_folder");
        let folder = {
            let mut tx = self.store.begin().await?;
            tx.lock_user(ctx.user_id).await?;
            require_folder(tx.as_mut(), ctx.user_id, &parent).await?;
            require_free_folder_slot(tx.as_mut(), ctx.user_id, &parent, &req.name).await?;
            self.require_no_stray_dir(&physical, &full).await?;

            let folder = tx
                .insert_folder(&NewFolder {
                    owner_id: ctx.user_id,
                    name: req.name.clone(),
                    parent_path: parent.clone(),
                })
                .await?;
            inherit_grants(tx.as_mut(), ctx.user_id, &parent, ItemId::Folder(folder.id)).await?;
            saga.record(Compensation::RemoveFolder {
                folder_id: folder.id,
            });
            tx.commit().await?;
            folder
        };

        if let Err(e) = self.storage.create_dir(&physical).await {
            return Err(saga.abort(self.store.as_ref(), e).await);
        }

        info!(
            owner_id = %ctx.user_id,
            folder_id = %folder.id,
            path = %full,
            "Folder created"
        );
        Ok(folder)
    }

    /// Create `logical` and every missing ancestor (`mkdir -p`).
    ///
    /// Returns the folders that were created, outermost first.
    pub async fn create_folder_path(
        &self,
        ctx: &RequestContext,
        logical: &str,
    ) -> AppResult<Vec<Folder>> {
        let target = path::normalize(logical)?;
        if path::is_root(&target) {
            return Ok(Vec::new());
        }

        let mut saga = Saga::new("create_folder_path");
        let created = {
            let mut tx = self.store.begin().await?;
            tx.lock_user(ctx.user_id).await?;

            let mut created = Vec::new();
            let mut current = path::ROOT.to_string();
            for segment in target.trim_start_matches('/').split('/') {
                let existing = tx
                    .find_folder(ctx.user_id, &current, segment, ItemStatus::Active)
                    .await?;
                if existing.is_none() {
                    layout::validate_folder_name(segment)?;
                    require_free_folder_slot(tx.as_mut(), ctx.user_id, &current, segment).await?;
                    let full = path::join(&current, segment);
                    self.require_no_stray_dir(&layout::folder_dir(&ctx.username, &full)?, &full)
                        .await?;
                    let folder = tx
                        .insert_folder(&NewFolder {
                            owner_id: ctx.user_id,
                            name: segment.to_string(),
                            parent_path: current.clone(),
                        })
                        .await?;
                    inherit_grants(tx.as_mut(), ctx.user_id, &current, ItemId::Folder(folder.id))
                        .await?;
                    saga.record(Compensation::RemoveFolder {
                        folder_id: folder.id,
                    });
                    created.push(folder);
                }
                current = path::join(&current, segment);
            }
            tx.commit().await?;
            created
        };

        if created.is_empty() {
            return Ok(created);
        }
        let physical = layout::folder_dir(&ctx.username, &target)?;
        if let Err(e) = self.storage.create_dir(&physical).await {
            return Err(saga.abort(self.store.as_ref(), e).await);
        }

        info!(
            owner_id = %ctx.user_id,
            path = %target,
            created = created.len(),
            "Folder path created"
        );
        Ok(created)
    }

    /// A directory without a folder row is an ambiguous state; refuse to
    /// adopt it.
    pub(super) async fn require_no_stray_dir(&self, physical: &str, logical: &str) -> AppResult<()> {
        if self.storage.exists(physical).await? {
            return Err(AppError::conflict(format!(
                "A directory for '{logical}' exists on disk without metadata"
            )));
        }
        Ok(())
    }
}
