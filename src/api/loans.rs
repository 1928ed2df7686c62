//! Loan endpoints

use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{Listing, Loan, LoanPayload, PageQuery},
    services::loans::RESOURCE,
    AppState,
};

use super::{cache_path, AuthenticatedUser, JsonPayload, QueryParams};

/// List loans, optionally paginated
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of loans", body = [Loan]),
        (status = 400, description = "Invalid pagination parameters")
    )
)]
pub async fn list_loans(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(query): QueryParams<PageQuery>,
) -> AppResult<Json<Listing<Loan>>> {
    let listing = state
        .services
        .cache
        .get_or_load(RESOURCE, cache_path(&uri), || state.services.loans.list(&query))
        .await?;
    Ok(Json(listing))
}

#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = Loan),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Loan>> {
    let loan = state.services.loans.get(id).await?;
    Ok(Json(loan))
}

/// Create a loan for a user
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = LoanPayload,
    responses(
        (status = 201, description = "Loan created", body = Loan),
        (status = 400, description = "Invalid input or unknown references"),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    payload: JsonPayload<LoanPayload>,
) -> AppResult<(StatusCode, Json<Loan>)> {
    claims.require_admin()?;

    let loan = state.services.loans.create(payload.decode()?).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

#[utoipa::path(
    put,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    request_body = LoanPayload,
    responses(
        (status = 200, description = "Loan updated", body = Loan),
        (status = 400, description = "Invalid input or unknown references"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn update_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    payload: JsonPayload<LoanPayload>,
) -> AppResult<Json<Loan>> {
    claims.require_admin()?;
    state.services.loans.ensure_exists(id).await?;

    let loan = state.services.loans.update(id, payload.decode()?).await?;
    Ok(Json(loan))
}

#[utoipa::path(
    delete,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan deleted", body = String),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn delete_loan(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<String>> {
    claims.require_admin()?;

    state.services.loans.delete(id).await?;
    Ok(Json(format!("Successfully deleted loan {}", id)))
}

/// Attach a book to a loan
#[utoipa::path(
    put,
    path = "/loans/{id}/add-book/{book_id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Loan ID"),
        ("book_id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Updated loan", body = Loan),
        (status = 404, description = "Loan or book not found"),
        (status = 409, description = "Book already on the loan")
    )
)]
pub async fn add_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, book_id)): Path<(i64, i64)>,
) -> AppResult<Json<Loan>> {
    claims.require_admin()?;

    let loan = state.services.loans.add_book(id, book_id).await?;
    Ok(Json(loan))
}

/// Detach a book from a loan
#[utoipa::path(
    put,
    path = "/loans/{id}/remove-book/{book_id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Loan ID"),
        ("book_id" = i64, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Updated loan", body = Loan),
        (status = 404, description = "Loan not found or book not on the loan")
    )
)]
pub async fn remove_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path((id, book_id)): Path<(i64, i64)>,
) -> AppResult<Json<Loan>> {
    claims.require_admin()?;

    let loan = state.services.loans.remove_book(id, book_id).await?;
    Ok(Json(loan))
}
