//! Share grant management with recursive propagation.
//!
//! The top-level grant is written in its own transaction and must succeed.
//! Grants are then copied onto (or removed from) each descendant one at a
//! time; a failing descendant is logged and skipped.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use cloudnest_auth::AccessGate;
use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::{ItemId, UserId};
use cloudnest_database::store::{MetadataStore, MetadataTx};
use cloudnest_entity::item::{Item, ItemStatus};
use cloudnest_entity::share::{ShareGrant, SharePermission, SharedItem};
use cloudnest_entity::user::User;

use crate::context::RequestContext;
use crate::request::{ShareRequest, validate_request};

/// Result of a share or unshare call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareOutcome {
    pub item: ItemId,
    pub grantee_id: UserId,
    /// The granted permission; `None` when access was revoked.
    pub permission: Option<SharePermission>,
    /// Descendants updated.
    pub propagated: usize,
    /// Descendants that could not be updated.
    pub failed: usize,
}

/// Owner-facing share operations.
#[derive(Debug, Clone)]
pub struct ShareService {
    store: Arc<dyn MetadataStore>,
}

impl ShareService {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Grant `grantee_username` access to an item and all its active descendants.
    ///
    /// Re-sharing replaces the previous permission.
    pub async fn share(&self, ctx: &RequestContext, req: ShareRequest) -> AppResult<ShareOutcome> {
        validate_request(&req)?;

        let (item, grantee) = {
            let mut tx = self.store.begin().await?;
            let (item, grantee) =
                resolve_target(tx.as_mut(), ctx, req.item, &req.grantee_username).await?;
            if item.status() != ItemStatus::Active {
                return Err(AppError::not_found(format!("Item {} is in the trash", req.item)));
            }
            tx.upsert_grant(&ShareGrant {
                item: req.item,
                grantee_id: grantee.id,
                permission: req.permission,
            })
            .await?;
            tx.commit().await?;
            (item, grantee)
        };

        let mut outcome = ShareOutcome {
            item: req.item,
            grantee_id: grantee.id,
            permission: Some(req.permission),
            propagated: 0,
            failed: 0,
        };
        for descendant in self.descendants(&item, true).await? {
            let grant = ShareGrant {
                item: descendant,
                grantee_id: grantee.id,
                permission: req.permission,
            };
            match self.upsert_one(&grant).await {
                Ok(()) => outcome.propagated += 1,
                Err(e) => {
                    warn!(
                        item = %descendant,
                        grantee_id = %grantee.id,
                        error = %e,
                        "Failed to propagate share grant"
                    );
                    outcome.failed += 1;
                }
            }
        }

        info!(
            owner_id = %ctx.user_id,
            item = %req.item,
            grantee = %grantee.username,
            permission = %req.permission,
            propagated = outcome.propagated,
            failed = outcome.failed,
            "Item shared"
        );
        Ok(outcome)
    }

    /// Revoke `grantee_username`'s access to an item and every descendant.
    pub async fn unshare(
        &self,
        ctx: &RequestContext,
        item_id: ItemId,
        grantee_username: &str,
    ) -> AppResult<ShareOutcome> {
        let (item, grantee) = {
            let mut tx = self.store.begin().await?;
            let (item, grantee) =
                resolve_target(tx.as_mut(), ctx, item_id, grantee_username).await?;
            tx.delete_grant(item_id, grantee.id).await?;
            tx.commit().await?;
            (item, grantee)
        };

        let mut outcome = ShareOutcome {
            item: item_id,
            grantee_id: grantee.id,
            permission: None,
            propagated: 0,
            failed: 0,
        };
        for descendant in self.descendants(&item, false).await? {
            match self.delete_one(descendant, grantee.id).await {
                Ok(()) => outcome.propagated += 1,
                Err(e) => {
                    warn!(
                        item = %descendant,
                        grantee_id = %grantee.id,
                        error = %e,
                        "Failed to revoke share grant"
                    );
                    outcome.failed += 1;
                }
            }
        }

        info!(
            owner_id = %ctx.user_id,
            item = %item_id,
            grantee = %grantee.username,
            propagated = outcome.propagated,
            failed = outcome.failed,
            "Item unshared"
        );
        Ok(outcome)
    }

    /// Grants on an item. Owner only.
    pub async fn list_grants(
        &self,
        ctx: &RequestContext,
        item_id: ItemId,
    ) -> AppResult<Vec<ShareGrant>> {
        let mut tx = self.store.begin().await?;
        let item = AccessGate::find_item(tx.as_mut(), item_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Item {item_id} not found")))?;
        if item.owner_id() != ctx.user_id {
            return Err(AppError::not_authorized("Only the owner can inspect grants"));
        }
        tx.list_grants(item_id).await
    }

    /// Active items shared with the caller, folders first.
    pub async fn shared_with_me(&self, ctx: &RequestContext) -> AppResult<Vec<SharedItem>> {
        let mut tx = self.store.begin().await?;
        tx.list_shared_with(ctx.user_id).await
    }

    /// Descendant IDs of a folder; empty for files.
    async fn descendants(&self, item: &Item, active_only: bool) -> AppResult<Vec<ItemId>> {
        let Item::Folder(folder) = item else {
            return Ok(Vec::new());
        };
        let root = folder.full_path();
        let mut tx = self.store.begin().await?;
        let folders = tx.list_folders_under(folder.owner_id, &root).await?;
        let files = tx.list_files_under(folder.owner_id, &root).await?;

        let mut ids: Vec<ItemId> = folders
            .iter()
            .filter(|f| !active_only || f.is_active())
            .map(|f| ItemId::Folder(f.id))
            .collect();
        ids.extend(
            files
                .iter()
                .filter(|f| !active_only || f.is_active())
                .map(|f| ItemId::File(f.id)),
        );
        Ok(ids)
    }

    async fn upsert_one(&self, grant: &ShareGrant) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        tx.upsert_grant(grant).await?;
        tx.commit().await
    }

    async fn delete_one(&self, item: ItemId, grantee: UserId) -> AppResult<()> {
        let mut tx = self.store.begin().await?;
        tx.delete_grant(item, grantee).await?;
        tx.commit().await
    }
}

/// Load the item, check the caller owns it, and resolve the grantee.
async fn resolve_target(
    tx: &mut dyn MetadataTx,
    ctx: &RequestContext,
    item_id: ItemId,
    grantee_username: &str,
) -> AppResult<(Item, User)> {
    let item = AccessGate::find_item(tx, item_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Item {item_id} not found")))?;
    if item.owner_id() != ctx.user_id {
        return Err(AppError::not_authorized("Only the owner can change sharing"));
    }

    let grantee = tx
        .find_user_by_username(grantee_username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User '{grantee_username}' not found")))?;
    if grantee.id == ctx.user_id {
        return Err(AppError::invalid_argument("Cannot share an item with yourself"));
    }
    Ok((item, grantee))
}
