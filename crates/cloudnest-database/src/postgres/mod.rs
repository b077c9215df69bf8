//! PostgreSQL metadata store.

mod file;
mod folder;
mod share;
mod user;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use cloudnest_core::error::{AppError, ErrorKind};
use cloudnest_core::result::AppResult;
use cloudnest_core::types::{FileId, FolderId, ItemId, UserId};
use cloudnest_entity::file::{File, NewFile};
use cloudnest_entity::folder::{Folder, NewFolder};
use cloudnest_entity::item::ItemStatus;
use cloudnest_entity::share::{ShareGrant, SharedItem};
use cloudnest_entity::user::{CreateUser, User};

use crate::store::{MetadataStore, MetadataTx};

/// Map a sqlx error, turning unique violations into `Conflict`.
pub(crate) fn db_error(context: &str, e: sqlx::Error) -> AppError {
    let unique = matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation());
    if unique {
        AppError::with_source(
            ErrorKind::Conflict,
            format!("{context}: the name is already in use"),
            e,
        )
    } else {
        AppError::with_source(ErrorKind::Internal, context.to_string(), e)
    }
}

/// Metadata store backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    fn backend(&self) -> &str {
        "postgres"
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| db_error("Health check failed", e))
    }

    async fn begin(&self) -> AppResult<Box<dyn MetadataTx>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;
        Ok(Box::new(PgMetadataTx { tx }))
    }
}

/// A transaction over [`PgMetadataStore`]. Rolled back by sqlx on drop.
struct PgMetadataTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl MetadataTx for PgMetadataTx {
    async fn find_user(&mut self, id: UserId) -> AppResult<Option<User>> {
        user::find(&mut self.tx, id).await
    }

    async fn find_user_by_username(&mut self, username: &str) -> AppResult<Option<User>> {
        user::find_by_username(&mut self.tx, username).await
    }

    async fn lock_user(&mut self, id: UserId) -> AppResult<User> {
        user::lock(&mut self.tx, id).await
    }

    async fn insert_user(&mut self, data: &CreateUser) -> AppResult<User> {
        user::insert(&mut self.tx, data).await
    }

    async fn delete_user(&mut self, id: UserId) -> AppResult<bool> {
        user::delete(&mut self.tx, id).await
    }

    async fn adjust_quota_used(&mut self, id: UserId, delta: i64) -> AppResult<User> {
        user::adjust_quota_used(&mut self.tx, id, delta).await
    }

    async fn set_quota_limit(&mut self, id: UserId, limit_bytes: i64) -> AppResult<User> {
        user::set_quota_limit(&mut self.tx, id, limit_bytes).await
    }

    async fn find_folder_by_id(&mut self, id: FolderId) -> AppResult<Option<Folder>> {
        folder::find_by_id(&mut self.tx, id).await
    }

    async fn find_folder(
        &mut self,
        owner: UserId,
        parent_path: &str,
        name: &str,
        status: ItemStatus,
    ) -> AppResult<Option<Folder>> {
        folder::find(&mut self.tx, owner, parent_path, name, status).await
    }

    async fn count_folders_at(
        &mut self,
        owner: UserId,
        parent_path: &str,
        name: &str,
    ) -> AppResult<u64> {
        folder::count_at(&mut self.tx, owner, parent_path, name).await
    }

    async fn list_folders(
        &mut self,
        owner: UserId,
        parent_path: &str,
        status: ItemStatus,
    ) -> AppResult<Vec<Folder>> {
        folder::list(&mut self.tx, owner, parent_path, status).await
    }

    async fn list_folders_with_status(
        &mut self,
        owner: UserId,
        status: ItemStatus,
    ) -> AppResult<Vec<Folder>> {
        folder::list_with_status(&mut self.tx, owner, status).await
    }

    async fn list_folders_under(&mut self, owner: UserId, root: &str) -> AppResult<Vec<Folder>> {
        folder::list_under(&mut self.tx, owner, root).await
    }

    async fn insert_folder(&mut self, data: &NewFolder) -> AppResult<Folder> {
        folder::insert(&mut self.tx, data).await
    }

    async fn relocate_folder(
        &mut self,
        id: FolderId,
        parent_path: &str,
        name: &str,
    ) -> AppResult<()> {
        folder::relocate(&mut self.tx, id, parent_path, name).await
    }

    async fn set_folder_status(&mut self, id: FolderId, status: ItemStatus) -> AppResult<()> {
        folder::set_status(&mut self.tx, id, status).await
    }

    async fn delete_folder(&mut self, id: FolderId) -> AppResult<bool> {
        folder::delete(&mut self.tx, id).await
    }

    async fn find_file_by_id(&mut self, id: FileId) -> AppResult<Option<File>> {
        file::find_by_id(&mut self.tx, id).await
    }

    async fn find_file(
        &mut self,
        owner: UserId,
        parent_path: &str,
        name: &str,
        status: ItemStatus,
    ) -> AppResult<Option<File>> {
        file::find(&mut self.tx, owner, parent_path, name, status).await
    }

    async fn list_files(
        &mut self,
        owner: UserId,
        parent_path: &str,
        status: ItemStatus,
    ) -> AppResult<Vec<File>> {
        file::list(&mut self.tx, owner, parent_path, status).await
    }

    async fn list_files_with_status(
        &mut self,
        owner: UserId,
        status: ItemStatus,
    ) -> AppResult<Vec<File>> {
        file::list_with_status(&mut self.tx, owner, status).await
    }

    async fn list_files_under(&mut self, owner: UserId, root: &str) -> AppResult<Vec<File>> {
        file::list_under(&mut self.tx, owner, root).await
    }

    async fn insert_file(&mut self, data: &NewFile) -> AppResult<File> {
        file::insert(&mut self.tx, data).await
    }

    async fn relocate_file(&mut self, id: FileId, parent_path: &str, name: &str) -> AppResult<()> {
        file::relocate(&mut self.tx, id, parent_path, name).await
    }

    async fn set_file_status(&mut self, id: FileId, status: ItemStatus) -> AppResult<()> {
        file::set_status(&mut self.tx, id, status).await
    }

    async fn delete_file(&mut self, id: FileId) -> AppResult<bool> {
        file::delete(&mut self.tx, id).await
    }

    async fn rewrite_path_prefix(
        &mut self,
        owner: UserId,
        old: &str,
        new: &str,
    ) -> AppResult<u64> {
        folder::rewrite_prefix(&mut self.tx, owner, old, new).await
    }

    async fn upsert_grant(&mut self, grant: &ShareGrant) -> AppResult<()> {
        share::upsert(&mut self.tx, grant).await
    }

    async fn delete_grant(&mut self, item: ItemId, grantee: UserId) -> AppResult<bool> {
        share::delete(&mut self.tx, item, grantee).await
    }

    async fn delete_grants_for(&mut self, item: ItemId) -> AppResult<u64> {
        share::delete_for(&mut self.tx, item).await
    }

    async fn find_grant(
        &mut self,
        item: ItemId,
        grantee: UserId,
    ) -> AppResult<Option<ShareGrant>> {
        share::find(&mut self.tx, item, grantee).await
    }

    async fn list_grants(&mut self, item: ItemId) -> AppResult<Vec<ShareGrant>> {
        share::list(&mut self.tx, item).await
    }

    async fn list_shared_with(&mut self, grantee: UserId) -> AppResult<Vec<SharedItem>> {
        share::list_shared_with(&mut self.tx, grantee).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| db_error("Failed to roll back transaction", e))
    }
}
