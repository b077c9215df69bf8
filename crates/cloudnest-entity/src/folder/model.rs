//! Folder entity model.

use chrono::{DateTime, Utc};
use cloudnest_core::types::path;
use cloudnest_core::types::{FolderId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::item::ItemStatus;

/// A folder in an owner's logical tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    pub id: FolderId,
    pub owner_id: UserId,
    pub name: String,
    /// Logical path of the containing folder (`/` for top-level folders).
    pub parent_path: String,
    pub status: ItemStatus,
    pub modified_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Folder {
    /// Full logical path: `parent_path + "/" + name`.
    pub fn full_path(&self) -> String {
        path::join(&self.parent_path, &self.name)
    }

    pub fn is_active(&self) -> bool {
        self.status == ItemStatus::Active
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFolder {
    pub owner_id: UserId,
    pub name: String,
    pub parent_path: String,
}
