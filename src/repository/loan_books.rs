//! `loan_books` association table, keyed by `(loan_id, book_id)`

use std::collections::HashMap;

use sqlx::SqliteConnection;

use super::limit_offset;
use crate::{error::AppResult, models::PageRequest};

pub async fn exists(conn: &mut SqliteConnection, loan_id: i64, book_id: i64) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM loan_books WHERE loan_id = ? AND book_id = ?)",
    )
    .bind(loan_id)
    .bind(book_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(exists)
}

pub async fn insert(conn: &mut SqliteConnection, loan_id: i64, book_id: i64) -> AppResult<()> {
    sqlx::query("INSERT INTO loan_books (loan_id, book_id) VALUES (?, ?)")
        .bind(loan_id)
        .bind(book_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Returns whether the pair existed
pub async fn delete(conn: &mut SqliteConnection, loan_id: i64, book_id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM loan_books WHERE loan_id = ? AND book_id = ?")
        .bind(loan_id)
        .bind(book_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_for_loan(conn: &mut SqliteConnection, loan_id: i64) -> AppResult<u64> {
    let result = sqlx::query("DELETE FROM loan_books WHERE loan_id = ?")
        .bind(loan_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Replace the whole association of a loan
pub async fn replace_for_loan(
    conn: &mut SqliteConnection,
    loan_id: i64,
    book_ids: &[i64],
) -> AppResult<()> {
    delete_for_loan(conn, loan_id).await?;
    for book_id in book_ids {
        insert(conn, loan_id, *book_id).await?;
    }
    Ok(())
}

pub async fn book_ids_for_loan(conn: &mut SqliteConnection, loan_id: i64) -> AppResult<Vec<i64>> {
    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT book_id FROM loan_books WHERE loan_id = ? ORDER BY book_id")
            .bind(loan_id)
            .fetch_all(&mut *conn)
            .await?;
    Ok(ids)
}

fn group(pairs: Vec<(i64, i64)>) -> HashMap<i64, Vec<i64>> {
    let mut grouped: HashMap<i64, Vec<i64>> = HashMap::new();
    for (loan_id, book_id) in pairs {
        grouped.entry(loan_id).or_default().push(book_id);
    }
    grouped
}

/// Book ids of the loans inside a `loans::list` window, keyed by loan id
pub async fn book_ids_for_window(
    conn: &mut SqliteConnection,
    window: Option<&PageRequest>,
) -> AppResult<HashMap<i64, Vec<i64>>> {
    let (limit, offset) = limit_offset(window);
    let pairs: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT loan_id, book_id FROM loan_books
        WHERE loan_id IN (SELECT id FROM loans ORDER BY id LIMIT ? OFFSET ?)
        ORDER BY loan_id, book_id
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?;
    Ok(group(pairs))
}

/// Book ids of every loan owned by a user, keyed by loan id
pub async fn book_ids_for_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> AppResult<HashMap<i64, Vec<i64>>> {
    let pairs: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT loan_id, book_id FROM loan_books
        WHERE loan_id IN (SELECT id FROM loans WHERE user_id = ?)
        ORDER BY loan_id, book_id
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(group(pairs))
}

/// Whether any loan still references the book
pub async fn book_is_referenced(conn: &mut SqliteConnection, book_id: i64) -> AppResult<bool> {
    let referenced: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loan_books WHERE book_id = ?)")
            .bind(book_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(referenced)
}
