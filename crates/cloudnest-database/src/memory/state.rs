//! Table contents of the in-memory metadata store.

use chrono::Utc;

use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::path;
use cloudnest_core::types::{FileId, FolderId, ItemId, UserId};
use cloudnest_entity::file::{File, NewFile};
use cloudnest_entity::folder::{Folder, NewFolder};
use cloudnest_entity::item::ItemStatus;
use cloudnest_entity::share::{ShareGrant, SharedItem};
use cloudnest_entity::user::{CreateUser, User};

/// All rows, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub(super) struct MemoryState {
    users: Vec<User>,
    folders: Vec<Folder>,
    files: Vec<File>,
    grants: Vec<ShareGrant>,
    last_file_id: i64,
}

fn under(parent_path: &str, root: &str) -> bool {
    path::is_within(parent_path, root)
}

impl MemoryState {
    // ── users ────────────────────────────────────────────────────────

    pub(super) fn find_user(&self, id: UserId) -> Option<User> {
        self.users.iter().find(|u| u.id == id).cloned()
    }

    pub(super) fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.users.iter().find(|u| u.username == username).cloned()
    }

    pub(super) fn insert_user(&mut self, data: &CreateUser) -> AppResult<User> {
        if self.users.iter().any(|u| u.username == data.username) {
            return Err(AppError::conflict(format!(
                "Username '{}' already exists",
                data.username
            )));
        }
        let user = User {
            id: UserId::new(),
            username: data.username.clone(),
            role: data.role,
            quota_limit_bytes: data.quota_limit_bytes,
            quota_used_bytes: 0,
            created_at: Utc::now(),
        };
        self.users.push(user.clone());
        Ok(user)
    }

    pub(super) fn delete_user(&mut self, id: UserId) -> bool {
        let before = self.users.len();
        self.users.retain(|u| u.id != id);
        before != self.users.len()
    }

    fn user_mut(&mut self, id: UserId) -> AppResult<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    pub(super) fn adjust_quota_used(&mut self, id: UserId, delta: i64) -> AppResult<User> {
        let user = self.user_mut(id)?;
        let next = user.quota_used_bytes + delta;
        if next < 0 {
            return Err(AppError::internal(format!(
                "Quota accounting for user {id} would drop below zero"
            )));
        }
        user.quota_used_bytes = next;
        Ok(user.clone())
    }

    pub(super) fn set_quota_limit(&mut self, id: UserId, limit: i64) -> AppResult<User> {
        let user = self.user_mut(id)?;
        user.quota_limit_bytes = limit;
        Ok(user.clone())
    }

    // ── folders ──────────────────────────────────────────────────────

    pub(super) fn find_folder_by_id(&self, id: FolderId) -> Option<Folder> {
        self.folders.iter().find(|f| f.id == id).cloned()
    }

    pub(super) fn find_folder(
        &self,
        owner: UserId,
        parent_path: &str,
        name: &str,
        status: ItemStatus,
    ) -> Option<Folder> {
        self.folders
            .iter()
            .filter(|f| {
                f.owner_id == owner
                    && f.parent_path == parent_path
                    && f.name == name
                    && f.status == status
            })
            .max_by_key(|f| f.modified_at)
            .cloned()
    }

    pub(super) fn count_folders_at(&self, owner: UserId, parent_path: &str, name: &str) -> u64 {
        self.folders
            .iter()
            .filter(|f| f.owner_id == owner && f.parent_path == parent_path && f.name == name)
            .count() as u64
    }

    pub(super) fn list_folders(
        &self,
        owner: UserId,
        parent_path: &str,
        status: ItemStatus,
    ) -> Vec<Folder> {
        self.folders
            .iter()
            .filter(|f| f.owner_id == owner && f.parent_path == parent_path && f.status == status)
            .cloned()
            .collect()
    }

    pub(super) fn list_folders_with_status(&self, owner: UserId, status: ItemStatus) -> Vec<Folder> {
        self.folders
            .iter()
            .filter(|f| f.owner_id == owner && f.status == status)
            .cloned()
            .collect()
    }

    pub(super) fn list_folders_under(&self, owner: UserId, root: &str) -> Vec<Folder> {
        self.folders
            .iter()
            .filter(|f| f.owner_id == owner && under(&f.parent_path, root))
            .cloned()
            .collect()
    }

    fn active_folder_taken(&self, owner: UserId, parent_path: &str, name: &str, skip: Option<FolderId>) -> bool {
        self.folders.iter().any(|f| {
            Some(f.id) != skip
                && f.owner_id == owner
                && f.parent_path == parent_path
                && f.name == name
                && f.status == ItemStatus::Active
        })
    }

    pub(super) fn insert_folder(&mut self, data: &NewFolder) -> AppResult<Folder> {
        if self.active_folder_taken(data.owner_id, &data.parent_path, &data.name, None) {
            return Err(folder_conflict(&data.parent_path, &data.name));
        }
        let now = Utc::now();
        let folder = Folder {
            id: FolderId::new(),
            owner_id: data.owner_id,
            name: data.name.clone(),
            parent_path: data.parent_path.clone(),
            status: ItemStatus::Active,
            modified_at: now,
            created_at: now,
        };
        self.folders.push(folder.clone());
        Ok(folder)
    }

    fn folder_mut(&mut self, id: FolderId) -> AppResult<&mut Folder> {
        self.folders
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
    }

    pub(super) fn relocate_folder(&mut self, id: FolderId, parent_path: &str, name: &str) -> AppResult<()> {
        let current = self
            .find_folder_by_id(id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        if current.is_active() && self.active_folder_taken(current.owner_id, parent_path, name, Some(id)) {
            return Err(folder_conflict(parent_path, name));
        }
        let folder = self.folder_mut(id)?;
        folder.parent_path = parent_path.to_string();
        folder.name = name.to_string();
        folder.modified_at = Utc::now();
        Ok(())
    }

    pub(super) fn set_folder_status(&mut self, id: FolderId, status: ItemStatus) -> AppResult<()> {
        let current = self
            .find_folder_by_id(id)
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;
        if status == ItemStatus::Active
            && self.active_folder_taken(current.owner_id, &current.parent_path, &current.name, Some(id))
        {
            return Err(folder_conflict(&current.parent_path, &current.name));
        }
        self.folder_mut(id)?.status = status;
        Ok(())
    }

    pub(super) fn delete_folder(&mut self, id: FolderId) -> bool {
        let before = self.folders.len();
        self.folders.retain(|f| f.id != id);
        self.grants.retain(|g| g.item != ItemId::Folder(id));
        before != self.folders.len()
    }

    // ── files ────────────────────────────────────────────────────────

    pub(super) fn find_file_by_id(&self, id: FileId) -> Option<File> {
        self.files.iter().find(|f| f.id == id).cloned()
    }

    pub(super) fn find_file(
        &self,
        owner: UserId,
        parent_path: &str,
        name: &str,
        status: ItemStatus,
    ) -> Option<File> {
        self.files
            .iter()
            .filter(|f| {
                f.owner_id == owner
                    && f.parent_path == parent_path
                    && f.name == name
                    && f.status == status
            })
            .max_by_key(|f| f.modified_at)
            .cloned()
    }

    pub(super) fn list_files(&self, owner: UserId, parent_path: &str, status: ItemStatus) -> Vec<File> {
        self.files
            .iter()
            .filter(|f| f.owner_id == owner && f.parent_path == parent_path && f.status == status)
            .cloned()
            .collect()
    }

    pub(super) fn list_files_with_status(&self, owner: UserId, status: ItemStatus) -> Vec<File> {
        self.files
            .iter()
            .filter(|f| f.owner_id == owner && f.status == status)
            .cloned()
            .collect()
    }

    pub(super) fn list_files_under(&self, owner: UserId, root: &str) -> Vec<File> {
        self.files
            .iter()
            .filter(|f| f.owner_id == owner && under(&f.parent_path, root))
            .cloned()
            .collect()
    }

    fn active_file_taken(&self, owner: UserId, parent_path: &str, name: &str, skip: Option<FileId>) -> bool {
        self.files.iter().any(|f| {
            Some(f.id) != skip
                && f.owner_id == owner
                && f.parent_path == parent_path
                && f.name == name
                && f.status == ItemStatus::Active
        })
    }

    pub(super) fn insert_file(&mut self, data: &NewFile) -> AppResult<File> {
        if self.active_file_taken(data.owner_id, &data.parent_path, &data.name, None) {
            return Err(file_conflict(&data.parent_path, &data.name));
        }
        self.last_file_id += 1;
        let now = Utc::now();
        let file = File {
            id: FileId(self.last_file_id),
            owner_id: data.owner_id,
            name: data.name.clone(),
            mime_type: data.mime_type.clone(),
            size_bytes: data.size_bytes,
            parent_path: data.parent_path.clone(),
            status: ItemStatus::Active,
            modified_at: now,
            created_at: now,
        };
        self.files.push(file.clone());
        Ok(file)
    }

    fn file_mut(&mut self, id: FileId) -> AppResult<&mut File> {
        self.files
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
    }

    pub(super) fn relocate_file(&mut self, id: FileId, parent_path: &str, name: &str) -> AppResult<()> {
        let current = self
            .find_file_by_id(id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        if current.is_active() && self.active_file_taken(current.owner_id, parent_path, name, Some(id)) {
            return Err(file_conflict(parent_path, name));
        }
        let file = self.file_mut(id)?;
        file.parent_path = parent_path.to_string();
        file.name = name.to_string();
        file.modified_at = Utc::now();
        Ok(())
    }

    pub(super) fn set_file_status(&mut self, id: FileId, status: ItemStatus) -> AppResult<()> {
        let current = self
            .find_file_by_id(id)
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;
        if status == ItemStatus::Active
            && self.active_file_taken(current.owner_id, &current.parent_path, &current.name, Some(id))
        {
            return Err(file_conflict(&current.parent_path, &current.name));
        }
        self.file_mut(id)?.status = status;
        Ok(())
    }

    pub(super) fn delete_file(&mut self, id: FileId) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.id != id);
        self.grants.retain(|g| g.item != ItemId::File(id));
        before != self.files.len()
    }

    // ── subtree ──────────────────────────────────────────────────────

    pub(super) fn rewrite_path_prefix(&mut self, owner: UserId, old: &str, new: &str) -> u64 {
        let mut changed = 0;
        for folder in self.folders.iter_mut().filter(|f| f.owner_id == owner) {
            if let Some(rebased) = path::rebase(&folder.parent_path, old, new) {
                folder.parent_path = rebased;
                changed += 1;
            }
        }
        for file in self.files.iter_mut().filter(|f| f.owner_id == owner) {
            if let Some(rebased) = path::rebase(&file.parent_path, old, new) {
                file.parent_path = rebased;
                changed += 1;
            }
        }
        changed
    }

    // ── grants ───────────────────────────────────────────────────────

    pub(super) fn upsert_grant(&mut self, grant: &ShareGrant) {
        match self
            .grants
            .iter_mut()
            .find(|g| g.item == grant.item && g.grantee_id == grant.grantee_id)
        {
            Some(existing) => existing.permission = grant.permission,
            None => self.grants.push(grant.clone()),
        }
    }

    pub(super) fn delete_grant(&mut self, item: ItemId, grantee: UserId) -> bool {
        let before = self.grants.len();
        self.grants
            .retain(|g| !(g.item == item && g.grantee_id == grantee));
        before != self.grants.len()
    }

    pub(super) fn delete_grants_for(&mut self, item: ItemId) -> u64 {
        let before = self.grants.len();
        self.grants.retain(|g| g.item != item);
        (before - self.grants.len()) as u64
    }

    pub(super) fn find_grant(&self, item: ItemId, grantee: UserId) -> Option<ShareGrant> {
        self.grants
            .iter()
            .find(|g| g.item == item && g.grantee_id == grantee)
            .cloned()
    }

    pub(super) fn list_grants(&self, item: ItemId) -> Vec<ShareGrant> {
        self.grants.iter().filter(|g| g.item == item).cloned().collect()
    }

    pub(super) fn list_shared_with(&self, grantee: UserId) -> Vec<SharedItem> {
        let owner_name = |owner: UserId| {
            self.find_user(owner)
                .map(|u| u.username)
                .unwrap_or_default()
        };
        let mut folders = Vec::new();
        let mut files = Vec::new();
        for grant in self.grants.iter().filter(|g| g.grantee_id == grantee) {
            match grant.item {
                ItemId::Folder(id) => {
                    if let Some(folder) = self.find_folder_by_id(id).filter(|f| f.is_active()) {
                        folders.push(SharedItem {
                            item: grant.item,
                            name: folder.name.clone(),
                            path: folder.full_path(),
                            is_dir: true,
                            size_bytes: 0,
                            modified_at: folder.modified_at,
                            owner_id: folder.owner_id,
                            owner_username: owner_name(folder.owner_id),
                            permission: grant.permission,
                        });
                    }
                }
                ItemId::File(id) => {
                    if let Some(file) = self.find_file_by_id(id).filter(|f| f.is_active()) {
                        files.push(SharedItem {
                            item: grant.item,
                            name: file.name.clone(),
                            path: file.full_path(),
                            is_dir: false,
                            size_bytes: file.size_bytes,
                            modified_at: file.modified_at,
                            owner_id: file.owner_id,
                            owner_username: owner_name(file.owner_id),
                            permission: grant.permission,
                        });
                    }
                }
            }
        }
        folders.extend(files);
        folders
    }
}

fn folder_conflict(parent_path: &str, name: &str) -> AppError {
    AppError::conflict(format!(
        "An active folder named '{name}' already exists in '{parent_path}'"
    ))
}

fn file_conflict(parent_path: &str, name: &str) -> AppError {
    AppError::conflict(format!(
        "An active file named '{name}' already exists in '{parent_path}'"
    ))
}
