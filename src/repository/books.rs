//! Books repository

use sqlx::SqliteConnection;

use super::limit_offset;
use crate::{
    error::AppResult,
    models::{Book, BookPopularity, NewBook, PageRequest},
};

const COLUMNS: &str = "id, title, genre, age_category, publish_date, author";

pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Book>> {
    let book = sqlx::query_as::<_, Book>(&format!("SELECT {COLUMNS} FROM books WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(book)
}

pub async fn exists(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?)")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(exists)
}

/// List books ordered by id, optionally windowed
pub async fn list(
    conn: &mut SqliteConnection,
    window: Option<&PageRequest>,
) -> AppResult<Vec<Book>> {
    let (limit, offset) = limit_offset(window);
    let books = sqlx::query_as::<_, Book>(&format!(
        "SELECT {COLUMNS} FROM books ORDER BY id LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?;
    Ok(books)
}

pub async fn count(conn: &mut SqliteConnection) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// Case-insensitive substring match on title
pub async fn search_by_title(conn: &mut SqliteConnection, needle: &str) -> AppResult<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>(&format!(
        "SELECT {COLUMNS} FROM books WHERE instr(lower(title), lower(?)) > 0 ORDER BY id"
    ))
    .bind(needle)
    .fetch_all(&mut *conn)
    .await?;
    Ok(books)
}

/// All books ranked by loan count, ties broken by id
pub async fn popularity(conn: &mut SqliteConnection) -> AppResult<Vec<BookPopularity>> {
    let ranked = sqlx::query_as::<_, BookPopularity>(
        r#"
        SELECT b.id, b.title, b.genre, b.age_category, b.publish_date, b.author,
               COUNT(lb.loan_id) AS loan_count
        FROM books b
        LEFT JOIN loan_books lb ON lb.book_id = b.id
        GROUP BY b.id
        ORDER BY loan_count DESC, b.id ASC
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(ranked)
}

/// Check if a title is already used by another book
pub async fn title_exists(
    conn: &mut SqliteConnection,
    title: &str,
    exclude_id: Option<i64>,
) -> AppResult<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE title = ? AND id != ?)")
            .bind(title)
            .bind(exclude_id.unwrap_or(0))
            .fetch_one(&mut *conn)
            .await?;
    Ok(exists)
}

pub async fn insert(conn: &mut SqliteConnection, book: &NewBook) -> AppResult<Book> {
    let created = sqlx::query_as::<_, Book>(&format!(
        r#"
        INSERT INTO books (title, genre, age_category, publish_date, author)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&book.title)
    .bind(&book.genre)
    .bind(&book.age_category)
    .bind(book.publish_date)
    .bind(&book.author)
    .fetch_one(&mut *conn)
    .await?;
    Ok(created)
}

/// Overwrite every column; `None` if the id does not exist
pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    book: &NewBook,
) -> AppResult<Option<Book>> {
    let updated = sqlx::query_as::<_, Book>(&format!(
        r#"
        UPDATE books
        SET title = ?, genre = ?, age_category = ?, publish_date = ?, author = ?
        WHERE id = ?
        RETURNING {COLUMNS}
        "#
    ))
    .bind(&book.title)
    .bind(&book.genre)
    .bind(&book.age_category)
    .bind(book.publish_date)
    .bind(&book.author)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(updated)
}

/// Returns whether a row was removed
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
