//! User queries.

use sqlx::PgConnection;

use cloudnest_core::error::AppError;
use cloudnest_core::result::AppResult;
use cloudnest_core::types::UserId;
use cloudnest_entity::user::{CreateUser, User};

use super::db_error;

pub(super) async fn find(conn: &mut PgConnection, id: UserId) -> AppResult<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to find user", e))
}

pub(super) async fn find_by_username(
    conn: &mut PgConnection,
    username: &str,
) -> AppResult<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to find user by username", e))
}

pub(super) async fn lock(conn: &mut PgConnection, id: UserId) -> AppResult<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to lock user", e))?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
}

pub(super) async fn insert(conn: &mut PgConnection, data: &CreateUser) -> AppResult<User> {
    sqlx::query_as::<_, User>(
        "INSERT INTO users (id, username, role, quota_limit_bytes) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(UserId::new())
    .bind(&data.username)
    .bind(data.role)
    .bind(data.quota_limit_bytes)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| db_error(&format!("Failed to create user '{}'", data.username), e))
}

pub(super) async fn delete(conn: &mut PgConnection, id: UserId) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to delete user", e))?;
    Ok(result.rows_affected() > 0)
}

pub(super) async fn adjust_quota_used(
    conn: &mut PgConnection,
    id: UserId,
    delta: i64,
) -> AppResult<User> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET quota_used_bytes = quota_used_bytes + $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(delta)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| db_error("Failed to update quota usage", e))?
    .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
}

pub(super) async fn set_quota_limit(
    conn: &mut PgConnection,
    id: UserId,
    limit_bytes: i64,
) -> AppResult<User> {
    sqlx::query_as::<_, User>("UPDATE users SET quota_limit_bytes = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(limit_bytes)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| db_error("Failed to update quota limit", e))?
        .ok_or_else(|| AppError::not_found(format!("User {id} not found")))
}
