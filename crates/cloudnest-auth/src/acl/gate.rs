//! Effective access resolver.
//!
//! Resolution order:
//! 1. Owner check: owners have full control over their items.
//! 2. Share grant: a grant on the item itself gives `read` or `write`,
//!    but only while the item is active.
//! 3. Otherwise no access.
//!
//! Grants are copied onto every descendant when a folder is shared, so no
//! ancestor walk happens here.

use std::sync::Arc;

use tracing::debug;

use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::{ItemId, UserId};
use cloudnest_database::store::{MetadataStore, MetadataTx};
use cloudnest_entity::item::Item;
use cloudnest_entity::share::SharePermission;

/// Effective access of one user on one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Owner,
    Write,
    Read,
    NoAccess,
}

impl Access {
    pub fn allows(&self, needed: SharePermission) -> bool {
        match self {
            Self::Owner => true,
            Self::Write => SharePermission::Write.allows(needed),
            Self::Read => SharePermission::Read.allows(needed),
            Self::NoAccess => false,
        }
    }
}

impl From<SharePermission> for Access {
    fn from(permission: SharePermission) -> Self {
        match permission {
            SharePermission::Read => Self::Read,
            SharePermission::Write => Self::Write,
        }
    }
}

/// The resolved item together with the requester's access to it.
#[derive(Debug, Clone)]
pub struct AccessDecision {
    pub item: Item,
    pub access: Access,
}

/// Gate consulted before a grantee's request reaches the namespace engine.
#[derive(Debug, Clone)]
pub struct AccessGate {
    store: Arc<dyn MetadataStore>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Look up an item by ID regardless of status.
    pub async fn find_item(tx: &mut dyn MetadataTx, id: ItemId) -> AppResult<Option<Item>> {
        Ok(match id {
            ItemId::File(file_id) => tx.find_file_by_id(file_id).await?.map(Item::File),
            ItemId::Folder(folder_id) => tx.find_folder_by_id(folder_id).await?.map(Item::Folder),
        })
    }

    /// Resolve the requester's effective access to `item`.
    pub async fn resolve(&self, requester: UserId, item: ItemId) -> AppResult<AccessDecision> {
        let mut tx = self.store.begin().await?;
        let resolved = Self::find_item(tx.as_mut(), item)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Item {item} not found")))?;

        let access = if resolved.owner_id() == requester {
            Access::Owner
        } else if resolved.status() != cloudnest_entity::item::ItemStatus::Active {
            Access::NoAccess
        } else {
            tx.find_grant(item, requester)
                .await?
                .map(|grant| Access::from(grant.permission))
                .unwrap_or(Access::NoAccess)
        };

        debug!(requester = %requester, item = %item, ?access, "Resolved access");
        Ok(AccessDecision {
            item: resolved,
            access,
        })
    }

    /// Resolve access and fail with `NotAuthorized` unless it covers `needed`.
    pub async fn require(
        &self,
        requester: UserId,
        item: ItemId,
        needed: SharePermission,
    ) -> AppResult<AccessDecision> {
        let decision = self.resolve(requester, item).await?;
        if decision.access.allows(needed) {
            Ok(decision)
        } else {
            Err(AppError::not_authorized(format!(
                "{needed} access to {item} denied"
            )))
        }
    }
}
