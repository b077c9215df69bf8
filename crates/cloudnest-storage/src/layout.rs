//! Mapping from logical locations to provider-relative physical paths.
//!
//! Each user owns `<username>/` under the data root. A folder at logical
//! path `/a/b` lives at `<username>/a/b`, and a file's bytes live at
//! `<username>/<parent path>/<file id>`. Folder directories and blobs share
//! a directory, so a folder may never be named like a file ID.

use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::path;
use cloudnest_core::types::FileId;

/// Physical root directory of a user.
pub fn user_root(username: &str) -> AppResult<String> {
    path::validate_username(username)?;
    Ok(username.to_string())
}

/// Physical directory backing the logical folder `logical`.
///
/// The logical path is re-normalized and must already be canonical; any
/// attempt to climb out of the user's root is `NotAuthorized`.
pub fn folder_dir(username: &str, logical: &str) -> AppResult<String> {
    let root = user_root(username)?;
    let canonical = path::normalize(logical)?;
    if canonical != logical {
        return Err(AppError::not_authorized(format!(
            "Logical path '{logical}' is not canonical"
        )));
    }
    if path::is_root(&canonical) {
        Ok(root)
    } else {
        Ok(format!("{root}{canonical}"))
    }
}

/// Whether `name` is spelled like a blob, i.e. a decimal file ID.
pub fn is_blob_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

/// Validate the name of a folder that is about to get a directory.
pub fn validate_folder_name(name: &str) -> AppResult<()> {
    path::validate_name(name)?;
    if is_blob_name(name) {
        return Err(AppError::invalid_argument(format!(
            "Folder name '{name}' is reserved: names made only of digits are used for stored files"
        )));
    }
    Ok(())
}

/// Physical location of a file's blob.
pub fn blob_path(username: &str, parent_path: &str, file_id: FileId) -> AppResult<String> {
    Ok(format!("{}/{}", folder_dir(username, parent_path)?, file_id))
}
