//! Metadata store abstraction.
//!
//! Every engine step opens one [`MetadataTx`], performs all of its reads and
//! writes through it, and commits. Dropping a transaction without calling
//! [`MetadataTx::commit`] discards its writes.

use async_trait::async_trait;

use cloudnest_core::result::AppResult;
use cloudnest_core::types::{FileId, FolderId, ItemId, UserId};
use cloudnest_entity::file::{File, NewFile};
use cloudnest_entity::folder::{Folder, NewFolder};
use cloudnest_entity::item::ItemStatus;
use cloudnest_entity::share::{ShareGrant, SharedItem};
use cloudnest_entity::user::{CreateUser, User};

/// Source of metadata transactions.
#[async_trait]
pub trait MetadataStore: Send + Sync + std::fmt::Debug + 'static {
    /// Backend name (`"postgres"`, `"memory"`).
    fn backend(&self) -> &str;

    /// Check whether the store is reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Open a transaction.
    async fn begin(&self) -> AppResult<Box<dyn MetadataTx>>;
}

/// One metadata transaction.
///
/// Path arguments are canonical logical paths. "Under `root`" always means
/// `parent_path == root` or `parent_path` starting with `root + "/"`.
#[async_trait]
pub trait MetadataTx: Send {
    // ── users ────────────────────────────────────────────────────────

    async fn find_user(&mut self, id: UserId) -> AppResult<Option<User>>;

    async fn find_user_by_username(&mut self, username: &str) -> AppResult<Option<User>>;

    /// Fetch the user row and hold it for the rest of the transaction so
    /// that writers on the same owner's tree are serialized.
    async fn lock_user(&mut self, id: UserId) -> AppResult<User>;

    async fn insert_user(&mut self, data: &CreateUser) -> AppResult<User>;

    async fn delete_user(&mut self, id: UserId) -> AppResult<bool>;

    /// Add `delta` (possibly negative) to the used-bytes counter. A result
    /// below zero is rejected.
    async fn adjust_quota_used(&mut self, id: UserId, delta: i64) -> AppResult<User>;

    async fn set_quota_limit(&mut self, id: UserId, limit_bytes: i64) -> AppResult<User>;

    // ── folders ──────────────────────────────────────────────────────

    async fn find_folder_by_id(&mut self, id: FolderId) -> AppResult<Option<Folder>>;

    /// Find a folder by location and status. With several trashed matches the
    /// most recently modified one wins.
    async fn find_folder(
        &mut self,
        owner: UserId,
        parent_path: &str,
        name: &str,
        status: ItemStatus,
    ) -> AppResult<Option<Folder>>;

    /// Count folder rows at a location regardless of status.
    async fn count_folders_at(
        &mut self,
        owner: UserId,
        parent_path: &str,
        name: &str,
    ) -> AppResult<u64>;

    /// Direct children of `parent_path` in insertion order.
    async fn list_folders(
        &mut self,
        owner: UserId,
        parent_path: &str,
        status: ItemStatus,
    ) -> AppResult<Vec<Folder>>;

    async fn list_folders_with_status(
        &mut self,
        owner: UserId,
        status: ItemStatus,
    ) -> AppResult<Vec<Folder>>;

    /// All folders under `root`, any status.
    async fn list_folders_under(&mut self, owner: UserId, root: &str) -> AppResult<Vec<Folder>>;

    async fn insert_folder(&mut self, data: &NewFolder) -> AppResult<Folder>;

    /// Change a folder's location and name. Descendants are not touched.
    async fn relocate_folder(
        &mut self,
        id: FolderId,
        parent_path: &str,
        name: &str,
    ) -> AppResult<()>;

    async fn set_folder_status(&mut self, id: FolderId, status: ItemStatus) -> AppResult<()>;

    async fn delete_folder(&mut self, id: FolderId) -> AppResult<bool>;

    // ── files ────────────────────────────────────────────────────────

    async fn find_file_by_id(&mut self, id: FileId) -> AppResult<Option<File>>;

    async fn find_file(
        &mut self,
        owner: UserId,
        parent_path: &str,
        name: &str,
        status: ItemStatus,
    ) -> AppResult<Option<File>>;

    async fn list_files(
        &mut self,
        owner: UserId,
        parent_path: &str,
        status: ItemStatus,
    ) -> AppResult<Vec<File>>;

    async fn list_files_with_status(
        &mut self,
        owner: UserId,
        status: ItemStatus,
    ) -> AppResult<Vec<File>>;

    /// All files under `root`, any status.
    async fn list_files_under(&mut self, owner: UserId, root: &str) -> AppResult<Vec<File>>;

    /// Insert a file row; the store assigns the ID.
    async fn insert_file(&mut self, data: &NewFile) -> AppResult<File>;

    async fn relocate_file(&mut self, id: FileId, parent_path: &str, name: &str) -> AppResult<()>;

    async fn set_file_status(&mut self, id: FileId, status: ItemStatus) -> AppResult<()>;

    async fn delete_file(&mut self, id: FileId) -> AppResult<bool>;

    // ── subtree ──────────────────────────────────────────────────────

    /// Rewrite the `old` prefix of every folder and file `parent_path` under
    /// `old` to `new`. Returns the number of rows changed.
    async fn rewrite_path_prefix(&mut self, owner: UserId, old: &str, new: &str)
    -> AppResult<u64>;

    // ── share grants ─────────────────────────────────────────────────

    /// Insert a grant or update the permission of an existing one.
    async fn upsert_grant(&mut self, grant: &ShareGrant) -> AppResult<()>;

    async fn delete_grant(&mut self, item: ItemId, grantee: UserId) -> AppResult<bool>;

    /// Remove every grant on an item. Returns how many were removed.
    async fn delete_grants_for(&mut self, item: ItemId) -> AppResult<u64>;

    async fn find_grant(&mut self, item: ItemId, grantee: UserId)
    -> AppResult<Option<ShareGrant>>;

    async fn list_grants(&mut self, item: ItemId) -> AppResult<Vec<ShareGrant>>;

    /// Active items shared with `grantee`, folders first.
    async fn list_shared_with(&mut self, grantee: UserId) -> AppResult<Vec<SharedItem>>;

    // ── lifecycle ────────────────────────────────────────────────────

    async fn commit(self: Box<Self>) -> AppResult<()>;

    async fn rollback(self: Box<Self>) -> AppResult<()>;
}
