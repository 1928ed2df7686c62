//! Items repository

use sqlx::SqliteConnection;

use super::limit_offset;
use crate::{
    error::AppResult,
    models::{Item, NewItem, PageRequest},
};

const COLUMNS: &str = "id, item_name, description, price";

pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Item>> {
    let item = sqlx::query_as::<_, Item>(&format!("SELECT {COLUMNS} FROM items WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(item)
}

pub async fn exists(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM items WHERE id = ?)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

pub async fn list(
    conn: &mut SqliteConnection,
    window: Option<&PageRequest>,
) -> AppResult<Vec<Item>> {
    let (limit, offset) = limit_offset(window);
    let items = sqlx::query_as::<_, Item>(&format!(
        "SELECT {COLUMNS} FROM items ORDER BY id LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?;
    Ok(items)
}

pub async fn count(conn: &mut SqliteConnection) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

pub async fn name_exists(
    conn: &mut SqliteConnection,
    item_name: &str,
    exclude_id: Option<i64>,
) -> AppResult<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM items WHERE item_name = ? AND id != ?)")
            .bind(item_name)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(&mut *conn)
            .await?;
    Ok(exists)
}

/// Whether any order still references the item
pub async fn is_referenced(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let referenced: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE item_id = ?)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(referenced)
}

pub async fn insert(conn: &mut SqliteConnection, item: &NewItem) -> AppResult<Item> {
    let created = sqlx::query_as::<_, Item>(&format!(
        r#"
        INSERT INTO items (item_name, description, price)
        VALUES (?, ?, ?)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&item.item_name)
    .bind(&item.description)
    .bind(item.price)
    .fetch_one(&mut *conn)
    .await?;
    Ok(created)
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    item: &NewItem,
) -> AppResult<Option<Item>> {
    let updated = sqlx::query_as::<_, Item>(&format!(
        r#"
        UPDATE items
        SET item_name = ?, description = ?, price = ?
        WHERE id = ?
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&item.item_name)
    .bind(&item.description)
    .bind(item.price)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(updated)
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM items WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
