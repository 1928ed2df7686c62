//! Shop item endpoints

use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{Item, ItemPayload, Listing, PageQuery},
    services::items::RESOURCE,
    AppState,
};

use super::{cache_path, AuthenticatedUser, JsonPayload, QueryParams};

#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of items", body = [Item]),
        (status = 400, description = "Invalid pagination parameters")
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(query): QueryParams<PageQuery>,
) -> AppResult<Json<Listing<Item>>> {
    let listing = state
        .services
        .cache
        .get_or_load(RESOURCE, cache_path(&uri), || state.services.items.list(&query))
        .await?;
    Ok(Json(listing))
}

#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item details", body = Item),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Item>> {
    let item = state.services.items.get(id).await?;
    Ok(Json(item))
}

#[utoipa::path(
    post,
    path = "/items",
    tag = "items",
    security(("bearer_auth" = [])),
    request_body = ItemPayload,
    responses(
        (status = 201, description = "Item created", body = Item),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    payload: JsonPayload<ItemPayload>,
) -> AppResult<(StatusCode, Json<Item>)> {
    claims.require_admin()?;

    let item = state.services.items.create(payload.decode()?).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    put,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    request_body = ItemPayload,
    responses(
        (status = 200, description = "Item updated", body = Item),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    payload: JsonPayload<ItemPayload>,
) -> AppResult<Json<Item>> {
    claims.require_admin()?;
    state.services.items.ensure_exists(id).await?;

    let item = state.services.items.update(id, payload.decode()?).await?;
    Ok(Json(item))
}

#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "items",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item deleted", body = String),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item has been ordered")
    )
)]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<String>> {
    claims.require_admin()?;

    state.services.items.delete(id).await?;
    Ok(Json(format!("Successfully deleted item {}", id)))
}
