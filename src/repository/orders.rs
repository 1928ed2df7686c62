//! Orders repository

use sqlx::SqliteConnection;

use super::limit_offset;
use crate::{
    error::AppResult,
    models::{NewOrder, Order, PageRequest},
};

const COLUMNS: &str = "id, user_id, item_id, quantity, order_date";

pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(&format!("SELECT {COLUMNS} FROM orders WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(order)
}

pub async fn list(
    conn: &mut SqliteConnection,
    window: Option<&PageRequest>,
) -> AppResult<Vec<Order>> {
    let (limit, offset) = limit_offset(window);
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT {COLUMNS} FROM orders ORDER BY id LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?;
    Ok(orders)
}

pub async fn count(conn: &mut SqliteConnection) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

pub async fn insert(conn: &mut SqliteConnection, order: &NewOrder) -> AppResult<Order> {
    let created = sqlx::query_as::<_, Order>(&format!(
        r#"
        INSERT INTO orders (user_id, item_id, quantity, order_date)
        VALUES (?, ?, ?, ?)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(order.user_id)
    .bind(order.item_id)
    .bind(order.quantity)
    .bind(order.order_date)
    .fetch_one(&mut *conn)
    .await?;
    Ok(created)
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    order: &NewOrder,
) -> AppResult<Option<Order>> {
    let updated = sqlx::query_as::<_, Order>(&format!(
        r#"
        UPDATE orders
        SET user_id = ?, item_id = ?, quantity = ?, order_date = ?
        WHERE id = ?
        RETURNING {COLUMNS}
        "#
    ))
    .bind(order.user_id)
    .bind(order.item_id)
    .bind(order.quantity)
    .bind(order.order_date)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(updated)
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
