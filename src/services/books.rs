//! Book catalog service

use crate::{
    error::{AppError, AppResult, FieldErrors},
    models::{Book, BookPopularity, BookPayload, Listing, PageQuery},
    repository::{books, loan_books, Repository},
    services::cache::ResponseCache,
};

pub const RESOURCE: &str = "books";

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    cache: ResponseCache,
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Book with id {} not found", id))
}

impl BooksService {
    pub fn new(repository: Repository, cache: ResponseCache) -> Self {
        Self { repository, cache }
    }

    pub async fn list(&self, query: &PageQuery) -> AppResult<Listing<Book>> {
        let window = query.resolve()?;
        let mut conn = self.repository.acquire().await?;
        let items = books::list(&mut conn, window.as_ref()).await?;
        match window {
            None => Ok(Listing::All(items)),
            Some(window) => {
                let total = books::count(&mut conn).await?;
                Ok(Listing::page(items, total, window))
            }
        }
    }

    pub async fn get(&self, id: i64) -> AppResult<Book> {
        let mut conn = self.repository.acquire().await?;
        books::get_by_id(&mut conn, id).await?.ok_or_else(|| not_found(id))
    }

    /// 404 check ahead of payload validation
    pub async fn ensure_exists(&self, id: i64) -> AppResult<()> {
        let mut conn = self.repository.acquire().await?;
        if books::exists(&mut conn, id).await? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }

    pub async fn search(&self, title: Option<&str>) -> AppResult<Vec<Book>> {
        let title = title.ok_or_else(|| {
            AppError::InvalidFields(FieldErrors::single("title", "Missing data for required field."))
        })?;
        let mut conn = self.repository.acquire().await?;
        books::search_by_title(&mut conn, title).await
    }

    pub async fn popularity(&self) -> AppResult<Vec<BookPopularity>> {
        let mut conn = self.repository.acquire().await?;
        books::popularity(&mut conn).await
    }

    pub async fn create(&self, payload: BookPayload) -> AppResult<Book> {
        let record = payload.into_record()?;

        let mut tx = self.repository.begin().await?;
        if books::title_exists(&mut *tx, &record.title, None).await? {
            return Err(AppError::InvalidFields(FieldErrors::single(
                "title",
                "A book with this title already exists.",
            )));
        }
        let book = books::insert(&mut *tx, &record).await?;
        tx.commit().await?;

        tracing::info!(book_id = book.id, "book created");
        self.cache.invalidate(RESOURCE).await;
        Ok(book)
    }

    /// Full replacement of every field
    pub async fn update(&self, id: i64, payload: BookPayload) -> AppResult<Book> {
        let record = payload.into_record()?;

        let mut tx = self.repository.begin().await?;
        if !books::exists(&mut *tx, id).await? {
            return Err(not_found(id));
        }
        if books::title_exists(&mut *tx, &record.title, Some(id)).await? {
            return Err(AppError::InvalidFields(FieldErrors::single(
                "title",
                "A book with this title already exists.",
            )));
        }
        let book = books::update(&mut *tx, id, &record)
            .await?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await?;

        tracing::info!(book_id = id, "book updated");
        self.cache.invalidate(RESOURCE).await;
        Ok(book)
    }

    /// Refuses to delete a book that still belongs to a loan
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.repository.begin().await?;
        if !books::exists(&mut *tx, id).await? {
            return Err(not_found(id));
        }
        if loan_books::book_is_referenced(&mut *tx, id).await? {
            return Err(AppError::Conflict(format!(
                "Book {} is part of one or more loans; remove it from them first",
                id
            )));
        }
        books::delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(book_id = id, "book deleted");
        self.cache.invalidate(RESOURCE).await;
        Ok(())
    }
}
