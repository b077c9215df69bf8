//! File entity model.

use chrono::{DateTime, Utc};
use cloudnest_core::types::path;
use cloudnest_core::types::{FileId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::item::ItemStatus;

/// Fallback content type when the uploader supplied none.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// A file record. The bytes live in the physical store under a blob named
/// by [`File::id`], so renames never move bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct File {
    pub id: FileId,
    pub owner_id: UserId,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub parent_path: String,
    pub status: ItemStatus,
    pub modified_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl File {
    pub fn full_path(&self) -> String {
        path::join(&self.parent_path, &self.name)
    }

    /// Name of the blob inside the parent folder's physical directory.
    pub fn blob_name(&self) -> String {
        self.id.to_string()
    }

    pub fn is_active(&self) -> bool {
        self.status == ItemStatus::Active
    }
}

/// Data required to insert a file row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFile {
    pub owner_id: UserId,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub parent_path: String,
}
