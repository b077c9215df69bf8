//! Validated request payloads for the mutating operations.

use serde::{Deserialize, Serialize};
use validator::Validate;

use cloudnest_core::error::{AppError, ErrorKind};
use cloudnest_core::result::AppResult;
use cloudnest_core::types::ItemId;
use cloudnest_entity::share::SharePermission;
use cloudnest_entity::user::UserRole;

/// Request to create a folder.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Logical path of the parent folder.
    pub parent_path: String,
    #[validate(length(min = 1, max = 255, message = "Folder name must be 1-255 characters"))]
    pub name: String,
}

/// Request to turn a staged upload into a file.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FinalizeUploadRequest {
    #[validate(length(min = 1, max = 128, message = "Staging id must be 1-128 characters"))]
    pub staging_id: String,
    /// Logical path of the destination folder.
    pub destination_path: String,
}

/// Request to move an item into another folder.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MoveItemRequest {
    #[validate(length(min = 1, message = "Source path is required"))]
    pub source_path: String,
    #[validate(length(min = 1, message = "Destination folder is required"))]
    pub destination_folder: String,
}

/// Request to grant a user access to an item.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShareRequest {
    pub item: ItemId,
    #[validate(length(min = 1, max = 64, message = "Grantee username is required"))]
    pub grantee_username: String,
    pub permission: SharePermission,
}

/// Request to provision a new user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProvisionUserRequest {
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,
    /// Falls back to the configured default when absent.
    #[validate(range(min = 0, message = "Quota limit cannot be negative"))]
    pub quota_limit_bytes: Option<i64>,
    #[serde(default)]
    pub role: UserRole,
}

/// Run derive-based validation, mapping failures to `InvalidArgument`.
pub fn validate_request<T: Validate>(request: &T) -> AppResult<()> {
    request.validate().map_err(|e| {
        AppError::with_source(ErrorKind::InvalidArgument, format!("Invalid request: {e}"), e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_folder_name_is_invalid() {
        let req = CreateFolderRequest {
            parent_path: "/".to_string(),
            name: String::new(),
        };
        let err = validate_request(&req).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_negative_quota_is_invalid() {
        let req = ProvisionUserRequest {
            username: "alice".to_string(),
            quota_limit_bytes: Some(-1),
            role: UserRole::User,
        };
        assert!(validate_request(&req).is_err());

        let ok = ProvisionUserRequest {
            quota_limit_bytes: None,
            ..req
        };
        assert!(validate_request(&ok).is_ok());
    }
}
