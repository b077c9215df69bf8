//! Account roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role stored on the user row. Only quota administration is role-gated;
/// every namespace operation is decided by ownership and share grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    /// May read and change quota limits of other users.
    pub fn manages_quotas(self) -> bool {
        self == Self::Admin
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Admin => "admin",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_admins_manage_quotas() {
        assert!(UserRole::Admin.manages_quotas());
        assert!(!UserRole::default().manages_quotas());
        assert_eq!(UserRole::Admin.to_string(), "admin");
    }
}
