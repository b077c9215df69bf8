//! Share grant queries. Folder and file grants live in separate tables;
//! [`ItemId`] picks the table.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};

use cloudnest_core::result::AppResult;
use cloudnest_core::types::path;
use cloudnest_core::types::{FileId, FolderId, ItemId, UserId};
use cloudnest_entity::share::{ShareGrant, SharePermission, SharedItem};

use super::db_error;

#[derive(Debug, FromRow)]
struct SharedFolderRow {
    id: FolderId,
    name: String,
    parent_path: String,
    modified_at: DateTime<Utc>,
    owner_id: UserId,
    owner_username: String,
    permission: SharePermission,
}

#[derive(Debug, FromRow)]
struct SharedFileRow {
    id: FileId,
    name: String,
    parent_path: String,
    size_bytes: i64,
    modified_at: DateTime<Utc>,
    owner_id: UserId,
    owner_username: String,
    permission: SharePermission,
}

pub(super) async fn upsert(conn: &mut PgConnection, grant: &ShareGrant) -> AppResult<()> {
    let query = match grant.item {
        ItemId::Folder(id) => sqlx::query(
            "INSERT INTO folder_shares (folder_id, grantee_id, permission) VALUES ($1, $2, $3) \
             ON CONFLICT (folder_id, grantee_id) DO UPDATE SET permission = EXCLUDED.permission",
        )
        .bind(id),
        ItemId::File(id) => sqlx::query(
            "INSERT INTO file_shares (file_id, grantee_id, permission) VALUES ($1, $2, $3) \
             ON CONFLICT (file_id, grantee_id) DO UPDATE SET permission = EXCLUDED.permission",
        )
        .bind(id),
    };
    query
        .bind(grant.grantee_id)
        .bind(grant.permission)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to save share grant", e))?;
    Ok(())
}

pub(super) async fn delete(conn: &mut PgConnection, item: ItemId, grantee: UserId) -> AppResult<bool> {
    let query = match item {
        ItemId::Folder(id) => {
            sqlx::query("DELETE FROM folder_shares WHERE folder_id = $1 AND grantee_id = $2").bind(id)
        }
        ItemId::File(id) => {
            sqlx::query("DELETE FROM file_shares WHERE file_id = $1 AND grantee_id = $2").bind(id)
        }
    };
    let result = query
        .bind(grantee)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to delete share grant", e))?;
    Ok(result.rows_affected() > 0)
}

pub(super) async fn delete_for(conn: &mut PgConnection, item: ItemId) -> AppResult<u64> {
    let query = match item {
        ItemId::Folder(id) => sqlx::query("DELETE FROM folder_shares WHERE folder_id = $1").bind(id),
        ItemId::File(id) => sqlx::query("DELETE FROM file_shares WHERE file_id = $1").bind(id),
    };
    let result = query
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to delete share grants", e))?;
    Ok(result.rows_affected())
}

pub(super) async fn find(
    conn: &mut PgConnection,
    item: ItemId,
    grantee: UserId,
) -> AppResult<Option<ShareGrant>> {
    let query = match item {
        ItemId::Folder(id) => sqlx::query_scalar::<_, SharePermission>(
            "SELECT permission FROM folder_shares WHERE folder_id = $1 AND grantee_id = $2",
        )
        .bind(id),
        ItemId::File(id) => sqlx::query_scalar::<_, SharePermission>(
            "SELECT permission FROM file_shares WHERE file_id = $1 AND grantee_id = $2",
        )
        .bind(id),
    };
    let permission = query
        .bind(grantee)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to find share grant", e))?;
    Ok(permission.map(|permission| ShareGrant {
        item,
        grantee_id: grantee,
        permission,
    }))
}

pub(super) async fn list(conn: &mut PgConnection, item: ItemId) -> AppResult<Vec<ShareGrant>> {
    let query = match item {
        ItemId::Folder(id) => sqlx::query_as::<_, (UserId, SharePermission)>(
            "SELECT grantee_id, permission FROM folder_shares WHERE folder_id = $1 ORDER BY created_at",
        )
        .bind(id),
        ItemId::File(id) => sqlx::query_as::<_, (UserId, SharePermission)>(
            "SELECT grantee_id, permission FROM file_shares WHERE file_id = $1 ORDER BY created_at",
        )
        .bind(id),
    };
    let rows = query
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to list share grants", e))?;
    Ok(rows
        .into_iter()
        .map(|(grantee_id, permission)| ShareGrant {
            item,
            grantee_id,
            permission,
        })
        .collect())
}

pub(super) async fn list_shared_with(
    conn: &mut PgConnection,
    grantee: UserId,
) -> AppResult<Vec<SharedItem>> {
    let folders = sqlx::query_as::<_, SharedFolderRow>(
        "SELECT f.id, f.name, f.parent_path, f.modified_at, f.owner_id, \
                u.username AS owner_username, s.permission \
         FROM folder_shares s \
         JOIN folders f ON f.id = s.folder_id \
         JOIN users u ON u.id = f.owner_id \
         WHERE s.grantee_id = $1 AND f.status = 'active' \
         ORDER BY s.created_at",
    )
    .bind(grantee)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| db_error("Failed to list shared folders", e))?;

    let files = sqlx::query_as::<_, SharedFileRow>(
        "SELECT f.id, f.name, f.parent_path, f.size_bytes, f.modified_at, f.owner_id, \
                u.username AS owner_username, s.permission \
         FROM file_shares s \
         JOIN files f ON f.id = s.file_id \
         JOIN users u ON u.id = f.owner_id \
         WHERE s.grantee_id = $1 AND f.status = 'active' \
         ORDER BY s.created_at",
    )
    .bind(grantee)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| db_error("Failed to list shared files", e))?;

    let mut items: Vec<SharedItem> = folders
        .into_iter()
        .map(|row| SharedItem {
            item: ItemId::Folder(row.id),
            path: path::join(&row.parent_path, &row.name),
            name: row.name,
            is_dir: true,
            size_bytes: 0,
            modified_at: row.modified_at,
            owner_id: row.owner_id,
            owner_username: row.owner_username,
            permission: row.permission,
        })
        .collect();
    items.extend(files.into_iter().map(|row| SharedItem {
        item: ItemId::File(row.id),
        path: path::join(&row.parent_path, &row.name),
        name: row.name,
        is_dir: false,
        size_bytes: row.size_bytes,
        modified_at: row.modified_at,
        owner_id: row.owner_id,
        owner_username: row.owner_username,
        permission: row.permission,
    }));
    Ok(items)
}
