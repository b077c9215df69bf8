//! Move and rename.
//!
//! Both change an item's `(parent_path, name)`. For folders the prefix of
//! every descendant row is rewritten in the same transaction. Blobs are named
//! by file ID, so renaming a file in place needs no physical step.

use tracing::{debug, info};

use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::path;
use cloudnest_entity::item::{Item, ItemStatus};
use cloudnest_storage::layout;

use super::{
    NamespaceService, find_item_at, require_folder, require_free_folder_slot, split_item_path,
};
use crate::context::RequestContext;
use crate::request::{MoveItemRequest, validate_request};
use crate::saga::{Compensation, Placement, Saga};

/// The physical rename a relocation needs after commit.
struct PhysicalMove {
    from: String,
    to: String,
}

impl NamespaceService {
    /// Move the item at `source_path` into `destination_folder`.
    pub async fn move_item(&self, ctx: &RequestContext, req: MoveItemRequest) -> AppResult<Item> {
        validate_request(&req)?;
        let source = path::normalize(&req.source_path)?;
        let destination = path::normalize(&req.destination_folder)?;
        let (_, name) = split_item_path(&source)?;
        let name = name.to_string();
        self.relocate(ctx, "move_item", &source, &destination, &name)
            .await
    }

    /// Rename the item at `logical` in place.
    pub async fn rename_item(
        &self,
        ctx: &RequestContext,
        logical: &str,
        new_name: &str,
    ) -> AppResult<Item> {
        path::validate_name(new_name)?;
        let source = path::normalize(logical)?;
        let (parent, _) = split_item_path(&source)?;
        let parent = parent.to_string();
        self.relocate(ctx, "rename_item", &source, &parent, new_name)
            .await
    }

    async fn relocate(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        source: &str,
        new_parent: &str,
        new_name: &str,
    ) -> AppResult<Item> {
        let target = path::join(new_parent, new_name);
        let mut saga = Saga::new(operation);

        let (item, physical) = {
            let mut tx = self.store.begin().await?;
            tx.lock_user(ctx.user_id).await?;

            let item = find_item_at(tx.as_mut(), ctx.user_id, source, ItemStatus::Active)
                .await?
                .ok_or_else(|| AppError::not_found(format!("No file or folder at '{source}'")))?;
            if target == source {
                return Ok(item);
            }
            require_folder(tx.as_mut(), ctx.user_id, new_parent).await?;

            let physical = physical_move(ctx, &item, new_parent, &target)?;
            let item = match item {
                Item::File(mut file) => {
                    if tx
                        .find_file(ctx.user_id, new_parent, new_name, ItemStatus::Active)
                        .await?
                        .is_some()
                    {
                        return Err(AppError::conflict(format!("File '{target}' already exists")));
                    }

                    tx.relocate_file(file.id, new_parent, new_name).await?;
                    saga.record(Compensation::PutBack {
                        placements: vec![Placement::of_file(&file)],
                    });
                    file.parent_path = new_parent.to_string();
                    file.name = new_name.to_string();
                    Item::File(file)
                }
                Item::Folder(mut folder) => {
                    if path::is_within(new_parent, source) {
                        return Err(AppError::invalid_argument(format!(
                            "Cannot move '{source}' into itself"
                        )));
                    }
                    if new_name != folder.name {
                        layout::validate_folder_name(new_name)?;
                    }
                    require_free_folder_slot(tx.as_mut(), ctx.user_id, new_parent, new_name)
                        .await?;
                    if let Some(step) = &physical {
                        self.require_no_stray_dir(&step.to, &target).await?;
                    }

                    // Snapshot every row that moves so a failed rename puts
                    // back these rows and nothing else.
                    let mut placements = vec![Placement::of_folder(&folder)];
                    for descendant in tx.list_folders_under(ctx.user_id, source).await? {
                        placements.push(Placement::of_folder(&descendant));
                    }
                    for file in tx.list_files_under(ctx.user_id, source).await? {
                        placements.push(Placement::of_file(&file));
                    }

                    tx.relocate_folder(folder.id, new_parent, new_name).await?;
                    let rewritten = tx
                        .rewrite_path_prefix(ctx.user_id, source, &target)
                        .await?;
                    debug!(path = %source, rewritten, "Rewrote descendant paths");
                    saga.record(Compensation::PutBack { placements });
                    folder.parent_path = new_parent.to_string();
                    folder.name = new_name.to_string();
                    Item::Folder(folder)
                }
            };
            tx.commit().await?;
            (item, physical)
        };

        if let Some(step) = physical {
            if let Err(e) = self.storage.rename(&step.from, &step.to).await {
                return Err(saga.abort(self.store.as_ref(), e).await);
            }
        }

        info!(
            operation,
            owner_id = %ctx.user_id,
            item = %item.id(),
            from = %source,
            to = %target,
            "Item relocated"
        );
        Ok(item)
    }
}

/// Work out which physical entry has to move, if any.
fn physical_move(
    ctx: &RequestContext,
    item: &Item,
    new_parent: &str,
    target: &str,
) -> AppResult<Option<PhysicalMove>> {
    match item {
        Item::File(file) if file.parent_path == new_parent => Ok(None),
        Item::File(file) => Ok(Some(PhysicalMove {
            from: layout::blob_path(&ctx.username, &file.parent_path, file.id)?,
            to: layout::blob_path(&ctx.username, new_parent, file.id)?,
        })),
        Item::Folder(folder) => Ok(Some(PhysicalMove {
            from: layout::folder_dir(&ctx.username, &folder.full_path())?,
            to: layout::folder_dir(&ctx.username, target)?,
        })),
    }
}
