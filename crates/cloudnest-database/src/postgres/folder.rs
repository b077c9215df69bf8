//! Folder queries.

use sqlx::PgConnection;

use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::path;
use cloudnest_core::types::{FolderId, UserId};
use cloudnest_entity::folder::{Folder, NewFolder};
use cloudnest_entity::item::ItemStatus;

use super::db_error;

pub(super) async fn find_by_id(conn: &mut PgConnection, id: FolderId) -> AppResult<Option<Folder>> {
    sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to find folder", e))
}

pub(super) async fn find(
    conn: &mut PgConnection,
    owner: UserId,
    parent_path: &str,
    name: &str,
    status: ItemStatus,
) -> AppResult<Option<Folder>> {
    sqlx::query_as::<_, Folder>(
        "SELECT * FROM folders \
         WHERE owner_id = $1 AND parent_path = $2 AND name = $3 AND status = $4 \
         ORDER BY modified_at DESC, seq DESC LIMIT 1",
    )
    .bind(owner)
    .bind(parent_path)
    .bind(name)
    .bind(status)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| db_error("Failed to find folder by path", e))
}

pub(super) async fn count_at(
    conn: &mut PgConnection,
    owner: UserId,
    parent_path: &str,
    name: &str,
) -> AppResult<u64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM folders WHERE owner_id = $1 AND parent_path = $2 AND name = $3",
    )
    .bind(owner)
    .bind(parent_path)
    .bind(name)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| db_error("Failed to count folders", e))?;
    Ok(count as u64)
}

pub(super) async fn list(
    conn: &mut PgConnection,
    owner: UserId,
    parent_path: &str,
    status: ItemStatus,
) -> AppResult<Vec<Folder>> {
    sqlx::query_as::<_, Folder>(
        "SELECT * FROM folders WHERE owner_id = $1 AND parent_path = $2 AND status = $3 \
         ORDER BY seq ASC",
    )
    .bind(owner)
    .bind(parent_path)
    .bind(status)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| db_error("Failed to list folders", e))
}

pub(super) async fn list_with_status(
    conn: &mut PgConnection,
    owner: UserId,
    status: ItemStatus,
) -> AppResult<Vec<Folder>> {
    sqlx::query_as::<_, Folder>(
        "SELECT * FROM folders WHERE owner_id = $1 AND status = $2 ORDER BY seq ASC",
    )
    .bind(owner)
    .bind(status)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| db_error("Failed to list folders by status", e))
}

pub(super) async fn list_under(
    conn: &mut PgConnection,
    owner: UserId,
    root: &str,
) -> AppResult<Vec<Folder>> {
    let query = if path::is_root(root) {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE owner_id = $1 ORDER BY seq ASC")
            .bind(owner)
    } else {
        sqlx::query_as::<_, Folder>(
            "SELECT * FROM folders \
             WHERE owner_id = $1 AND (parent_path = $2 OR starts_with(parent_path, $3)) \
             ORDER BY seq ASC",
        )
        .bind(owner)
        .bind(root)
        .bind(format!("{root}/"))
    };
    query
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to list descendant folders", e))
}

pub(super) async fn insert(conn: &mut PgConnection, data: &NewFolder) -> AppResult<Folder> {
    sqlx::query_as::<_, Folder>(
        "INSERT INTO folders (id, owner_id, name, parent_path) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(FolderId::new())
    .bind(data.owner_id)
    .bind(&data.name)
    .bind(&data.parent_path)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        db_error(
            &format!("Failed to create folder '{}' in '{}'", data.name, data.parent_path),
            e,
        )
    })
}

pub(super) async fn relocate(
    conn: &mut PgConnection,
    id: FolderId,
    parent_path: &str,
    name: &str,
) -> AppResult<()> {
    let result = sqlx::query(
        "UPDATE folders SET parent_path = $2, name = $3, modified_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(parent_path)
    .bind(name)
    .execute(&mut *conn)
    .await
    .map_err(|e| db_error("Failed to relocate folder", e))?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("Folder {id} not found")));
    }
    Ok(())
}

pub(super) async fn set_status(
    conn: &mut PgConnection,
    id: FolderId,
    status: ItemStatus,
) -> AppResult<()> {
    let result = sqlx::query("UPDATE folders SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to update folder status", e))?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("Folder {id} not found")));
    }
    Ok(())
}

pub(super) async fn delete(conn: &mut PgConnection, id: FolderId) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM folders WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to delete folder", e))?;
    Ok(result.rows_affected() > 0)
}

/// Rewrite descendant `parent_path` prefixes in both entity tables.
pub(super) async fn rewrite_prefix(
    conn: &mut PgConnection,
    owner: UserId,
    old: &str,
    new: &str,
) -> AppResult<u64> {
    // Joining onto the root must not produce a double slash.
    let stem = if path::is_root(new) { "" } else { new };
    let mut changed = 0;
    for table in ["folders", "files"] {
        let sql = format!(
            "UPDATE {table} SET parent_path = CASE \
                 WHEN parent_path = $2::text THEN $3::text \
                 ELSE $5::text || substr(parent_path, char_length($2::text) + 1) \
             END \
             WHERE owner_id = $1 AND (parent_path = $2::text OR starts_with(parent_path, $4::text))"
        );
        let result = sqlx::query(&sql)
            .bind(owner)
            .bind(old)
            .bind(new)
            .bind(format!("{old}/"))
            .bind(stem)
            .execute(&mut *conn)
            .await
            .map_err(|e| db_error("Failed to rewrite descendant paths", e))?;
        changed += result.rows_affected();
    }
    Ok(changed)
}
