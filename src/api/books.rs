//! Book catalog endpoints

use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{book::BookSearchQuery, Book, BookPayload, BookPopularity, Listing, PageQuery},
    services::books::RESOURCE,
    AppState,
};

use super::{cache_path, AuthenticatedUser, JsonPayload, QueryParams};

/// List books, optionally paginated
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<i64>, Query, description = "Items per page (default: 20, max: 100)")
    ),
    responses(
        (status = 200, description = "Books ordered by id, or a page envelope when paginated", body = [Book]),
        (status = 400, description = "Invalid pagination parameters")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(query): QueryParams<PageQuery>,
) -> AppResult<Json<Listing<Book>>> {
    let listing = state
        .services
        .cache
        .get_or_load(RESOURCE, cache_path(&uri), || state.services.books.list(&query))
        .await?;
    Ok(Json(listing))
}

/// Case-insensitive title search
#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(
        ("title" = String, Query, description = "Substring to look for in titles")
    ),
    responses(
        (status = 200, description = "Matching books, possibly none", body = [Book]),
        (status = 400, description = "Missing title")
    )
)]
pub async fn search_books(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(query): QueryParams<BookSearchQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state
        .services
        .cache
        .get_or_load(RESOURCE, cache_path(&uri), || {
            state.services.books.search(query.title.as_deref())
        })
        .await?;
    Ok(Json(books))
}

/// Books ranked by how many loans include them
#[utoipa::path(
    get,
    path = "/books/popularity",
    tag = "books",
    responses(
        (status = 200, description = "Books by loan count, most borrowed first", body = [BookPopularity])
    )
)]
pub async fn book_popularity(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
) -> AppResult<Json<Vec<BookPopularity>>> {
    let ranking = state
        .services
        .cache
        .get_or_load(RESOURCE, cache_path(&uri), || state.services.books.popularity())
        .await?;
    Ok(Json(ranking))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Book>> {
    let book = state.services.books.get(id).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    payload: JsonPayload<BookPayload>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require_admin()?;

    let book = state.services.books.create(payload.decode()?).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Replace an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    payload: JsonPayload<BookPayload>,
) -> AppResult<Json<Book>> {
    claims.require_admin()?;
    state.services.books.ensure_exists(id).await?;

    let book = state.services.books.update(id, payload.decode()?).await?;
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book deleted", body = String),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book still belongs to a loan")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<String>> {
    claims.require_admin()?;

    state.services.books.delete(id).await?;
    Ok(Json(format!("Successfully deleted book {}", id)))
}
