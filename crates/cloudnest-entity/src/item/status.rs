//! Lifecycle of files and folders.

use serde::{Deserialize, Serialize};
use std::fmt;

/// `Active -> Trashed -> Active` via restore, or out of existence via purge.
/// Purging removes the row, so there is no third state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Active,
    Trashed,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Trashed => "trashed",
        })
    }
}
