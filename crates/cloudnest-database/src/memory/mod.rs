//! In-memory metadata store.
//!
//! A transaction takes the store-wide lock and works on a private copy of
//! every table; `commit` publishes the copy, dropping discards it. Writers
//! (and readers) are therefore fully serialized. Suitable for tests and
//! single-process tooling only.

mod state;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::{FileId, FolderId, ItemId, UserId};
use cloudnest_entity::file::{File, NewFile};
use cloudnest_entity::folder::{Folder, NewFolder};
use cloudnest_entity::item::ItemStatus;
use cloudnest_entity::share::{ShareGrant, SharedItem};
use cloudnest_entity::user::{CreateUser, User};

use self::state::MemoryState;
use crate::store::{MetadataStore, MetadataTx};

/// Process-local metadata store.
#[derive(Debug, Clone, Default)]
pub struct MemoryMetadataStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    fn backend(&self) -> &str {
        "memory"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }

    async fn begin(&self) -> AppResult<Box<dyn MetadataTx>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }
}

/// A transaction over [`MemoryMetadataStore`].
struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl MetadataTx for MemoryTx {
    async fn find_user(&mut self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.working.find_user(id))
    }

    async fn find_user_by_username(&mut self, username: &str) -> AppResult<Option<User>> {
        Ok(self.working.find_user_by_username(username))
    }

    async fn lock_user(&mut self, id: UserId) -> AppResult<User> {
        self.working
            .find_user(id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
    }

    async fn insert_user(&mut self, data: &CreateUser) -> AppResult<User> {
        self.working.insert_user(data)
    }

    async fn delete_user(&mut self, id: UserId) -> AppResult<bool> {
        Ok(self.working.delete_user(id))
    }

    async fn adjust_quota_used(&mut self, id: UserId, delta: i64) -> AppResult<User> {
        self.working.adjust_quota_used(id, delta)
    }

    async fn set_quota_limit(&mut self, id: UserId, limit_bytes: i64) -> AppResult<User> {
        self.working.set_quota_limit(id, limit_bytes)
    }

    async fn find_folder_by_id(&mut self, id: FolderId) -> AppResult<Option<Folder>> {
        Ok(self.working.find_folder_by_id(id))
    }

    async fn find_folder(
        &mut self,
        owner: UserId,
        parent_path: &str,
        name: &str,
        status: ItemStatus,
    ) -> AppResult<Option<Folder>> {
        Ok(self.working.find_folder(owner, parent_path, name, status))
    }

    async fn count_folders_at(
        &mut self,
        owner: UserId,
        parent_path: &str,
        name: &str,
    ) -> AppResult<u64> {
        Ok(self.working.count_folders_at(owner, parent_path, name))
    }

    async fn list_folders(
        &mut self,
        owner: UserId,
        parent_path: &str,
        status: ItemStatus,
    ) -> AppResult<Vec<Folder>> {
        Ok(self.working.list_folders(owner, parent_path, status))
    }

    async fn list_folders_with_status(
        &mut self,
        owner: UserId,
        status: ItemStatus,
    ) -> AppResult<Vec<Folder>> {
        Ok(self.working.list_folders_with_status(owner, status))
    }

    async fn list_folders_under(&mut self, owner: UserId, root: &str) -> AppResult<Vec<Folder>> {
        Ok(self.working.list_folders_under(owner, root))
    }

    async fn insert_folder(&mut self, data: &NewFolder) -> AppResult<Folder> {
        self.working.insert_folder(data)
    }

    async fn relocate_folder(
        &mut self,
        id: FolderId,
        parent_path: &str,
        name: &str,
    ) -> AppResult<()> {
        self.working.relocate_folder(id, parent_path, name)
    }

    async fn set_folder_status(&mut self, id: FolderId, status: ItemStatus) -> AppResult<()> {
        self.working.set_folder_status(id, status)
    }

    async fn delete_folder(&mut self, id: FolderId) -> AppResult<bool> {
        Ok(self.working.delete_folder(id))
    }

    async fn find_file_by_id(&mut self, id: FileId) -> AppResult<Option<File>> {
        Ok(self.working.find_file_by_id(id))
    }

    async fn find_file(
        &mut self,
        owner: UserId,
        parent_path: &str,
        name: &str,
        status: ItemStatus,
    ) -> AppResult<Option<File>> {
        Ok(self.working.find_file(owner, parent_path, name, status))
    }

    async fn list_files(
        &mut self,
        owner: UserId,
        parent_path: &str,
        status: ItemStatus,
    ) -> AppResult<Vec<File>> {
        Ok(self.working.list_files(owner, parent_path, status))
    }

    async fn list_files_with_status(
        &mut self,
        owner: UserId,
        status: ItemStatus,
    ) -> AppResult<Vec<File>> {
        Ok(self.working.list_files_with_status(owner, status))
    }

    async fn list_files_under(&mut self, owner: UserId, root: &str) -> AppResult<Vec<File>> {
        Ok(self.working.list_files_under(owner, root))
    }

    async fn insert_file(&mut self, data: &NewFile) -> AppResult<File> {
        self.working.insert_file(data)
    }

    async fn relocate_file(&mut self, id: FileId, parent_path: &str, name: &str) -> AppResult<()> {
        self.working.relocate_file(id, parent_path, name)
    }

    async fn set_file_status(&mut self, id: FileId, status: ItemStatus) -> AppResult<()> {
        self.working.set_file_status(id, status)
    }

    async fn delete_file(&mut self, id: FileId) -> AppResult<bool> {
        Ok(self.working.delete_file(id))
    }

    async fn rewrite_path_prefix(
        &mut self,
        owner: UserId,
        old: &str,
        new: &str,
    ) -> AppResult<u64> {
        Ok(self.working.rewrite_path_prefix(owner, old, new))
    }

    async fn upsert_grant(&mut self, grant: &ShareGrant) -> AppResult<()> {
        self.working.upsert_grant(grant);
        Ok(())
    }

    async fn delete_grant(&mut self, item: ItemId, grantee: UserId) -> AppResult<bool> {
        Ok(self.working.delete_grant(item, grantee))
    }

    async fn delete_grants_for(&mut self, item: ItemId) -> AppResult<u64> {
        Ok(self.working.delete_grants_for(item))
    }

    async fn find_grant(
        &mut self,
        item: ItemId,
        grantee: UserId,
    ) -> AppResult<Option<ShareGrant>> {
        Ok(self.working.find_grant(item, grantee))
    }

    async fn list_grants(&mut self, item: ItemId) -> AppResult<Vec<ShareGrant>> {
        Ok(self.working.list_grants(item))
    }

    async fn list_shared_with(&mut self, grantee: UserId) -> AppResult<Vec<SharedItem>> {
        Ok(self.working.list_shared_with(grantee))
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}
