//! Share grant models.

use chrono::{DateTime, Utc};
use cloudnest_core::types::{ItemId, UserId};
use serde::{Deserialize, Serialize};

use super::permission::SharePermission;

/// A (grantee, item, permission) record. Unique per (grantee, item).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareGrant {
    pub item: ItemId,
    pub grantee_id: UserId,
    pub permission: SharePermission,
}

/// An entry of a grantee's shared-with-me listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedItem {
    pub item: ItemId,
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub size_bytes: i64,
    pub modified_at: DateTime<Utc>,
    pub owner_id: UserId,
    pub owner_username: String,
    pub permission: SharePermission,
}
