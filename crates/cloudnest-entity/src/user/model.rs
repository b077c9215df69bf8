//! User entity model.

use chrono::{DateTime, Utc};
use cloudnest_core::types::UserId;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::quota::QuotaInfo;
use super::role::UserRole;

/// A tenant of the system. Owns exactly one logical tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: UserRole,
    pub quota_limit_bytes: i64,
    pub quota_used_bytes: i64,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn quota(&self) -> QuotaInfo {
        QuotaInfo::new(self.quota_limit_bytes, self.quota_used_bytes)
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub role: UserRole,
    pub quota_limit_bytes: i64,
}
