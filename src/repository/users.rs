//! Users repository

use sqlx::SqliteConnection;

use super::limit_offset;
use crate::{
    auth::Role,
    error::AppResult,
    models::{NewUser, PageRequest, User},
};

const COLUMNS: &str = "id, username, email, password, dob, address, role";

pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(user)
}

/// Get user by email (login), case-insensitive
pub async fn get_by_email(conn: &mut SqliteConnection, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE LOWER(email) = LOWER(?)"
    ))
    .bind(email)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(user)
}

pub async fn exists(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

pub async fn list(
    conn: &mut SqliteConnection,
    window: Option<&PageRequest>,
) -> AppResult<Vec<User>> {
    let (limit, offset) = limit_offset(window);
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users ORDER BY id LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?;
    Ok(users)
}

pub async fn count(conn: &mut SqliteConnection) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// Check if email already exists
pub async fn email_exists(
    conn: &mut SqliteConnection,
    email: &str,
    exclude_id: Option<i64>,
) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER(?) AND id != ?)",
    )
    .bind(email)
    .bind(exclude_id.unwrap_or(0))
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

/// Check if username already exists
pub async fn username_exists(
    conn: &mut SqliteConnection,
    username: &str,
    exclude_id: Option<i64>,
) -> AppResult<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ? AND id != ?)")
            .bind(username)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(&mut *conn)
            .await?;
    Ok(exists)
}

/// Whether any loan or order still points at the user
pub async fn is_referenced(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let referenced: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(SELECT 1 FROM loans WHERE user_id = ?1)
            OR EXISTS(SELECT 1 FROM orders WHERE user_id = ?1)
        "#,
    )
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(referenced)
}

pub async fn insert(
    conn: &mut SqliteConnection,
    user: &NewUser,
    password_hash: &str,
    role: Role,
) -> AppResult<User> {
    let created = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, email, password, dob, address, role)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&user.username)
    .bind(&user.email)
    .bind(password_hash)
    .bind(user.dob)
    .bind(&user.address)
    .bind(role)
    .fetch_one(&mut *conn)
    .await?;
    Ok(created)
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    user: &NewUser,
    password_hash: &str,
    role: Role,
) -> AppResult<Option<User>> {
    let updated = sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET username = ?, email = ?, password = ?, dob = ?, address = ?, role = ?
        WHERE id = ?
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&user.username)
    .bind(&user.email)
    .bind(password_hash)
    .bind(user.dob)
    .bind(&user.address)
    .bind(role)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(updated)
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
