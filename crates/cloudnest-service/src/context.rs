//! Request context carrying the resolved caller identity.

use serde::{Deserialize, Serialize};

use cloudnest_core::types::UserId;
use cloudnest_entity::user::{User, UserRole};

/// The acting identity, passed explicitly to every service call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The user performing the operation.
    pub user_id: UserId,
    /// Username; also the name of the user's physical root.
    pub username: String,
    pub role: UserRole,
}

impl RequestContext {
    pub fn new(user_id: UserId, username: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn manages_quotas(&self) -> bool {
        self.role.manages_quotas()
    }
}

impl From<&User> for RequestContext {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.username.clone(), user.role)
    }
}
