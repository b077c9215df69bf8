//! Unified view over files and folders.

use chrono::{DateTime, Utc};
use cloudnest_core::types::{ItemId, UserId};
use serde::{Deserialize, Serialize};

use super::status::ItemStatus;
use crate::file::File;
use crate::folder::Folder;

/// A resolved namespace entry of either kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Item {
    File(File),
    Folder(Folder),
}

impl Item {
    pub fn id(&self) -> ItemId {
        match self {
            Self::File(f) => ItemId::File(f.id),
            Self::Folder(f) => ItemId::Folder(f.id),
        }
    }

    pub fn owner_id(&self) -> UserId {
        match self {
            Self::File(f) => f.owner_id,
            Self::Folder(f) => f.owner_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::File(f) => &f.name,
            Self::Folder(f) => &f.name,
        }
    }

    pub fn parent_path(&self) -> &str {
        match self {
            Self::File(f) => &f.parent_path,
            Self::Folder(f) => &f.parent_path,
        }
    }

    pub fn status(&self) -> ItemStatus {
        match self {
            Self::File(f) => f.status,
            Self::Folder(f) => f.status,
        }
    }

    pub fn full_path(&self) -> String {
        match self {
            Self::File(f) => f.full_path(),
            Self::Folder(f) => f.full_path(),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Folder(_))
    }
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemInfo {
    pub id: ItemId,
    pub name: String,
    /// Always 0 for folders.
    pub size_bytes: i64,
    pub modified_at: DateTime<Utc>,
    pub is_dir: bool,
    /// Full logical path of the entry.
    pub path: String,
}

impl From<&Folder> for ItemInfo {
    fn from(folder: &Folder) -> Self {
        Self {
            id: ItemId::Folder(folder.id),
            name: folder.name.clone(),
            size_bytes: 0,
            modified_at: folder.modified_at,
            is_dir: true,
            path: folder.full_path(),
        }
    }
}

impl From<&File> for ItemInfo {
    fn from(file: &File) -> Self {
        Self {
            id: ItemId::File(file.id),
            name: file.name.clone(),
            size_bytes: file.size_bytes,
            modified_at: file.modified_at,
            is_dir: false,
            path: file.full_path(),
        }
    }
}

impl From<&Item> for ItemInfo {
    fn from(item: &Item) -> Self {
        match item {
            Item::File(f) => f.into(),
            Item::Folder(f) => f.into(),
        }
    }
}
