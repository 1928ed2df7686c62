//! Repository layer for database operations
//!
//! Each submodule is a set of free functions over `&mut SqliteConnection`, so
//! the same query runs on a pooled connection or inside a transaction.

pub mod books;
pub mod items;
pub mod loan_books;
pub mod loans;
pub mod orders;
pub mod users;

use sqlx::{pool::PoolConnection, migrate::MigrateError, Sqlite, SqlitePool, Transaction};

use crate::error::AppResult;

/// Owner of the connection pool
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check out a connection; it returns to the pool on drop
    pub async fn acquire(&self) -> AppResult<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    /// Start a transaction; dropping it without `commit` rolls back
    pub async fn begin(&self) -> AppResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Apply embedded schema migrations (idempotent)
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Round-trip a trivial query
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// `(limit, offset)` for an optional window; SQLite treats a negative limit as unbounded
pub(crate) fn limit_offset(window: Option<&crate::models::PageRequest>) -> (i64, i64) {
    window
        .map(|w| (w.per_page, w.offset()))
        .unwrap_or((-1, 0))
}
