//! API handlers for the Bibliotheca REST endpoints

pub mod books;
pub mod health;
pub mod items;
pub mod loans;
pub mod openapi;
pub mod orders;
pub mod users;

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{header::AUTHORIZATION, request::Parts, Uri},
    routing::{get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    auth::Claims,
    error::{AppError, AppResult, FieldErrors},
    AppState,
};

/// Key under which body and query decoding errors are reported
pub const SCHEMA_FIELD: &str = "_schema";

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = state.tokens.decode(token)?;
        Ok(AuthenticatedUser(claims))
    }
}

/// Like [`AuthenticatedUser`], but a request without credentials is anonymous.
/// A credential that is present and invalid is still rejected.
pub struct OptionalUser(pub Option<Claims>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(OptionalUser(None));
        }
        let AuthenticatedUser(claims) = AuthenticatedUser::from_request_parts(parts, state).await?;
        Ok(OptionalUser(Some(claims)))
    }
}

/// JSON body whose decoding error is held until [`JsonPayload::decode`],
/// so handlers can answer 404 for an unknown id before judging the body.
pub struct JsonPayload<T>(Result<T, AppError>);

impl<T> JsonPayload<T> {
    pub fn decode(self) -> AppResult<T> {
        self.0
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for JsonPayload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let decoded = match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(value),
            Err(rejection) => Err(AppError::InvalidFields(FieldErrors::single(
                SCHEMA_FIELD,
                rejection.body_text(),
            ))),
        };
        Ok(JsonPayload(decoded))
    }
}

/// Query string extractor reporting failures as field errors
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| QueryParams(value))
            .map_err(|rejection| {
                AppError::InvalidFields(FieldErrors::single(SCHEMA_FIELD, rejection.body_text()))
            })
    }
}

/// Path and query of a request, used as the response cache key
pub(crate) fn cache_path(uri: &Uri) -> &str {
    uri.path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path())
}

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Users
        .route("/users/login", post(users::login))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/users/:id/loans", get(users::get_user_loans))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/search", get(books::search_books))
        .route("/books/popularity", get(books::book_popularity))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        // Loans
        .route("/loans", get(loans::list_loans).post(loans::create_loan))
        .route(
            "/loans/:id",
            get(loans::get_loan).put(loans::update_loan).delete(loans::delete_loan),
        )
        .route("/loans/:id/add-book/:book_id", put(loans::add_book))
        .route("/loans/:id/remove-book/:book_id", put(loans::remove_book))
        // Shop items
        .route("/items", get(items::list_items).post(items::create_item))
        .route(
            "/items/:id",
            get(items::get_item).put(items::update_item).delete(items::delete_item),
        )
        // Orders
        .route("/orders", get(orders::list_orders).post(orders::create_order))
        .route(
            "/orders/:id",
            get(orders::get_order).put(orders::update_order).delete(orders::delete_order),
        )
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
