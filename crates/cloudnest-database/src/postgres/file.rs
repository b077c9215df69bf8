//! File queries.

use sqlx::PgConnection;

use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::path;
use cloudnest_core::types::{FileId, UserId};
use cloudnest_entity::file::{File, NewFile};
use cloudnest_entity::item::ItemStatus;

use super::db_error;

pub(super) async fn find_by_id(conn: &mut PgConnection, id: FileId) -> AppResult<Option<File>> {
    sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to find file", e))
}

pub(super) async fn find(
    conn: &mut PgConnection,
    owner: UserId,
    parent_path: &str,
    name: &str,
    status: ItemStatus,
) -> AppResult<Option<File>> {
    sqlx::query_as::<_, File>(
        "SELECT * FROM files \
         WHERE owner_id = $1 AND parent_path = $2 AND name = $3 AND status = $4 \
         ORDER BY modified_at DESC, id DESC LIMIT 1",
    )
    .bind(owner)
    .bind(parent_path)
    .bind(name)
    .bind(status)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| db_error("Failed to find file by path", e))
}

pub(super) async fn list(
    conn: &mut PgConnection,
    owner: UserId,
    parent_path: &str,
    status: ItemStatus,
) -> AppResult<Vec<File>> {
    sqlx::query_as::<_, File>(
        "SELECT * FROM files WHERE owner_id = $1 AND parent_path = $2 AND status = $3 \
         ORDER BY id ASC",
    )
    .bind(owner)
    .bind(parent_path)
    .bind(status)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| db_error("Failed to list files", e))
}

pub(super) async fn list_with_status(
    conn: &mut PgConnection,
    owner: UserId,
    status: ItemStatus,
) -> AppResult<Vec<File>> {
    sqlx::query_as::<_, File>("SELECT * FROM files WHERE owner_id = $1 AND status = $2 ORDER BY id ASC")
        .bind(owner)
        .bind(status)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to list files by status", e))
}

pub(super) async fn list_under(
    conn: &mut PgConnection,
    owner: UserId,
    root: &str,
) -> AppResult<Vec<File>> {
    let query = if path::is_root(root) {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE owner_id = $1 ORDER BY id ASC")
            .bind(owner)
    } else {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE owner_id = $1 AND (parent_path = $2 OR starts_with(parent_path, $3)) \
             ORDER BY id ASC",
        )
        .bind(owner)
        .bind(root)
        .bind(format!("{root}/"))
    };
    query
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to list descendant files", e))
}

pub(super) async fn insert(conn: &mut PgConnection, data: &NewFile) -> AppResult<File> {
    sqlx::query_as::<_, File>(
        "INSERT INTO files (owner_id, name, mime_type, size_bytes, parent_path) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(data.owner_id)
    .bind(&data.name)
    .bind(&data.mime_type)
    .bind(data.size_bytes)
    .bind(&data.parent_path)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        db_error(
            &format!("Failed to create file '{}' in '{}'", data.name, data.parent_path),
            e,
        )
    })
}

pub(super) async fn relocate(
    conn: &mut PgConnection,
    id: FileId,
    parent_path: &str,
    name: &str,
) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE files SET parent_path = $2, name = $3, modified_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(parent_path)
    .bind(name)
    .execute(&mut *conn)
    .await
    .map_err(|e| db_error("Failed to relocate file", e))?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("File {id} not found")));
    }
    Ok(())
}

pub(super) async fn set_status(
    conn: &mut PgConnection,
    id: FileId,
    status: ItemStatus,
) -> AppResult<()> {
    let result = sqlx::query("UPDATE files SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to update file status", e))?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("File {id} not found")));
    }
    Ok(())
}

pub(super) async fn delete(conn: &mut PgConnection, id: FileId) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM files WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to delete file", e))?;
    Ok(result.rows_affected() > 0)
}
