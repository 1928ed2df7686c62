//! User management and login endpoints

use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{Listing, Loan, LoginRequest, PageQuery, User, UserPayload},
    services::users::RESOURCE,
    AppState,
};

use super::{cache_path, AuthenticatedUser, JsonPayload, OptionalUser, QueryParams};

/// Login response
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,
    pub user: User,
}

/// Authenticate with email and password
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: JsonPayload<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (email, password) = payload.decode()?.into_credentials()?;
    let (token, user) = state.services.users.login(&email, &password).await?;
    Ok(Json(LoginResponse { token, user }))
}

/// List users, optionally paginated
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of users", body = [User]),
        (status = 400, description = "Invalid pagination parameters")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(query): QueryParams<PageQuery>,
) -> AppResult<Json<Listing<User>>> {
    let listing = state
        .services
        .cache
        .get_or_load(RESOURCE, cache_path(&uri), || state.services.users.list(&query))
        .await?;
    Ok(Json(listing))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<User>> {
    let user = state.services.users.get(id).await?;
    Ok(Json(user))
}

/// Loans belonging to a user
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User loans", body = [Loan]),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_loans(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state
        .services
        .cache
        .get_or_load(RESOURCE, cache_path(&uri), || state.services.users.loans(id))
        .await?;
    Ok(Json(loans))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = UserPayload,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Only administrators may create admin accounts")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    OptionalUser(caller): OptionalUser,
    payload: JsonPayload<UserPayload>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state
        .services
        .users
        .register(caller.as_ref(), payload.decode()?)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Replace a user record
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = UserPayload,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not allowed to modify this user"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    payload: JsonPayload<UserPayload>,
) -> AppResult<Json<User>> {
    claims.require_self_or_admin(id)?;
    state.services.users.ensure_exists(id).await?;

    let user = state
        .services
        .users
        .update(&claims, id, payload.decode()?)
        .await?;
    Ok(Json(user))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = String),
        (status = 404, description = "User not found"),
        (status = 409, description = "User still has loans or orders")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<String>> {
    claims.require_self_or_admin(id)?;

    state.services.users.delete(id).await?;
    Ok(Json(format!("Successfully deleted user {}", id)))
}
