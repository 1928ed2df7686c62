//! Loan management service

use sqlx::SqliteConnection;

use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::{Listing, Loan, LoanPayload, NewLoan, PageQuery},
    repository::{books, loan_books, loans, users, Repository},
    services::{books::RESOURCE as BOOKS, cache::ResponseCache, users::RESOURCE as USERS},
};

pub const RESOURCE: &str = "loans";

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    cache: ResponseCache,
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Loan with id {} not found", id))
}

/// Load the loan row and its book ids
async fn load(conn: &mut SqliteConnection, id: i64) -> AppResult<Option<Loan>> {
    let Some(row) = loans::get_by_id(conn, id).await? else {
        return Ok(None);
    };
    let book_ids = loan_books::book_ids_for_loan(conn, id).await?;
    Ok(Some(Loan::from_row(row, book_ids)))
}

/// Check the user and book references of a loan
async fn check_references(conn: &mut SqliteConnection, record: &NewLoan) -> AppResult<()> {
    let mut errors = FieldErrors::new();
    if !users::exists(conn, record.user_id).await? {
        errors.add("user_id", format!("User {} does not exist.", record.user_id));
    }

    let mut missing = Vec::new();
    for book_id in &record.book_ids {
        if !books::exists(conn, *book_id).await? {
            missing.push(book_id.to_string());
        }
    }
    if !missing.is_empty() {
        errors.add("book_ids", format!("Unknown book id(s): {}.", missing.join(", ")));
    }
    errors.into_result()
}

impl LoansService {
    pub fn new(repository: Repository, cache: ResponseCache) -> Self {
        Self { repository, cache }
    }

    pub async fn list(&self, query: &PageQuery) -> AppResult<Listing<Loan>> {
        let window = query.resolve()?;
        let mut conn = self.repository.acquire().await?;
        let rows = loans::list(&mut conn, window.as_ref()).await?;
        let mut books = loan_books::book_ids_for_window(&mut conn, window.as_ref()).await?;
        let items: Vec<Loan> = rows
            .into_iter()
            .map(|row| {
                let book_ids = books.remove(&row.id).unwrap_or_default();
                Loan::from_row(row, book_ids)
            })
            .collect();

        match window {
            None => Ok(Listing::All(items)),
            Some(window) => {
                let total = loans::count(&mut conn).await?;
                Ok(Listing::page(items, total, window))
            }
        }
    }

    pub async fn get(&self, id: i64) -> AppResult<Loan> {
        let mut conn = self.repository.acquire().await?;
        load(&mut conn, id).await?.ok_or_else(|| not_found(id))
    }

    pub async fn ensure_exists(&self, id: i64) -> AppResult<()> {
        let mut conn = self.repository.acquire().await?;
        match loans::get_by_id(&mut conn, id).await? {
            Some(_) => Ok(()),
            None => Err(not_found(id)),
        }
    }

    pub async fn create(&self, payload: LoanPayload) -> AppResult<Loan> {
        let record = payload.into_record()?;

        let mut tx = self.repository.begin().await?;
        check_references(&mut *tx, &record).await?;
        let row = loans::insert(&mut *tx, &record).await?;
        loan_books::replace_for_loan(&mut *tx, row.id, &record.book_ids).await?;
        let loan = load(&mut *tx, row.id).await?.ok_or_else(|| not_found(row.id))?;
        tx.commit().await?;

        tracing::info!(loan_id = loan.id, user_id = loan.user_id, books = loan.book_ids.len(), "loan created");
        self.invalidate().await;
        Ok(loan)
    }

    /// Full replacement, including the set of books
    pub async fn update(&self, id: i64, payload: LoanPayload) -> AppResult<Loan> {
        let record = payload.into_record()?;

        let mut tx = self.repository.begin().await?;
        if loans::get_by_id(&mut *tx, id).await?.is_none() {
            return Err(not_found(id));
        }
        check_references(&mut *tx, &record).await?;
        loans::update(&mut *tx, id, &record)
            .await?
            .ok_or_else(|| not_found(id))?;
        loan_books::replace_for_loan(&mut *tx, id, &record.book_ids).await?;
        let loan = load(&mut *tx, id).await?.ok_or_else(|| not_found(id))?;
        tx.commit().await?;

        tracing::info!(loan_id = id, "loan updated");
        self.invalidate().await;
        Ok(loan)
    }

    /// Removes the loan and its book associations together
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        if loans::get_by_id(&mut *tx, id).await?.is_none() {
            return Err(not_found(id));
        }
        loan_books::delete_for_loan(&mut *tx, id).await?;
        loans::delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(loan_id = id, "loan deleted");
        self.invalidate().await;
        Ok(())
    }

    pub async fn add_book(&self, loan_id: i64, book_id: i64) -> AppResult<Loan> {
        let mut tx = self.repository.begin().await?;
        if loans::get_by_id(&mut *tx, loan_id).await?.is_none() {
            return Err(not_found(loan_id));
        }
        if !books::exists(&mut *tx, book_id).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }
        if loan_books::exists(&mut *tx, loan_id, book_id).await? {
            return Err(AppError::Conflict(format!(
                "Book {} is already part of loan {}",
                book_id, loan_id
            )));
        }
        loan_books::insert(&mut *tx, loan_id, book_id).await?;
        let loan = load(&mut *tx, loan_id).await?.ok_or_else(|| not_found(loan_id))?;
        tx.commit().await?;

        tracing::info!(loan_id, book_id, "book added to loan");
        self.invalidate().await;
        Ok(loan)
    }

    pub async fn remove_book(&self, loan_id: i64, book_id: i64) -> AppResult<Loan> {
        let mut tx = self.repository.begin().await?;
        if loans::get_by_id(&mut *tx, loan_id).await?.is_none() {
            return Err(not_found(loan_id));
        }
        if !loan_books::delete(&mut *tx, loan_id, book_id).await? {
            return Err(AppError::NotFound(format!(
                "Book {} is not part of loan {}",
                book_id, loan_id
            )));
        }
        let loan = load(&mut *tx, loan_id).await?.ok_or_else(|| not_found(loan_id))?;
        tx.commit().await?;

        tracing::info!(loan_id, book_id, "book removed from loan");
        self.invalidate().await;
        Ok(loan)
    }

    /// Loans feed book popularity and per-user listings
    async fn invalidate(&self) {
        self.cache.invalidate(RESOURCE).await;
        self.cache.invalidate(BOOKS).await;
        self.cache.invalidate(USERS).await;
    }
}
