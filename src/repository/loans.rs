//! Loans repository

use sqlx::SqliteConnection;

use super::limit_offset;
use crate::{
    error::AppResult,
    models::{LoanRow, NewLoan, PageRequest},
};

const COLUMNS: &str = "id, user_id, loan_date, deadline, return_date";

pub async fn get_by_id(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<LoanRow>> {
    let loan = sqlx::query_as::<_, LoanRow>(&format!("SELECT {COLUMNS} FROM loans WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(loan)
}

pub async fn list(
    conn: &mut SqliteConnection,
    window: Option<&PageRequest>,
) -> AppResult<Vec<LoanRow>> {
    let (limit, offset) = limit_offset(window);
    let loans = sqlx::query_as::<_, LoanRow>(&format!(
        "SELECT {COLUMNS} FROM loans ORDER BY id LIMIT ? OFFSET ?"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(&mut *conn)
    .await?;
    Ok(loans)
}

pub async fn count(conn: &mut SqliteConnection) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM loans")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// Get loans for a user
pub async fn list_for_user(conn: &mut SqliteConnection, user_id: i64) -> AppResult<Vec<LoanRow>> {
    let loans = sqlx::query_as::<_, LoanRow>(&format!(
        "SELECT {COLUMNS} FROM loans WHERE user_id = ? ORDER BY id"
    ))
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(loans)
}

/// Insert the loan row only; books are attached through `loan_books`
pub async fn insert(conn: &mut SqliteConnection, loan: &NewLoan) -> AppResult<LoanRow> {
    let created = sqlx::query_as::<_, LoanRow>(&format!(
        r#"
        INSERT INTO loans (user_id, loan_date, deadline, return_date)
        VALUES (?, ?, ?, ?)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(loan.user_id)
    .bind(loan.loan_date)
    .bind(loan.deadline)
    .bind(loan.return_date)
    .fetch_one(&mut *conn)
    .await?;
    Ok(created)
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    loan: &NewLoan,
) -> AppResult<Option<LoanRow>> {
    let updated = sqlx::query_as::<_, LoanRow>(&format!(
        r#"
        UPDATE loans
        SET user_id = ?, loan_date = ?, deadline = ?, return_date = ?
        WHERE id = ?
        RETURNING {COLUMNS}
        "#
    ))
    .bind(loan.user_id)
    .bind(loan.loan_date)
    .bind(loan.deadline)
    .bind(loan.return_date)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(updated)
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM loans WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
