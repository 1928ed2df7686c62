//! Order endpoints

use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{Listing, Order, OrderPayload, PageQuery},
    services::orders::RESOURCE,
    AppState,
};

use super::{cache_path, AuthenticatedUser, JsonPayload, QueryParams};

#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number"),
        ("per_page" = Option<i64>, Query, description = "Items per page")
    ),
    responses(
        (status = 200, description = "List of orders", body = [Order]),
        (status = 400, description = "Invalid pagination parameters")
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    QueryParams(query): QueryParams<PageQuery>,
) -> AppResult<Json<Listing<Order>>> {
    let listing = state
        .services
        .cache
        .get_or_load(RESOURCE, cache_path(&uri), || state.services.orders.list(&query))
        .await?;
    Ok(Json(listing))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "orders",
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order details", body = Order),
        (status = 404, description = "Order not found")
    )
)]
pub async fn get_order(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Order>> {
    let order = state.services.orders.get(id).await?;
    Ok(Json(order))
}

/// Place an order for an item
#[utoipa::path(
    post,
    path = "/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    request_body = OrderPayload,
    responses(
        (status = 201, description = "Order created", body = Order),
        (status = 400, description = "Invalid input or unknown references"),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    payload: JsonPayload<OrderPayload>,
) -> AppResult<(StatusCode, Json<Order>)> {
    claims.require_admin()?;

    let order = state.services.orders.create(payload.decode()?).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[utoipa::path(
    put,
    path = "/orders/{id}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    request_body = OrderPayload,
    responses(
        (status = 200, description = "Order updated", body = Order),
        (status = 400, description = "Invalid input or unknown references"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn update_order(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
    payload: JsonPayload<OrderPayload>,
) -> AppResult<Json<Order>> {
    claims.require_admin()?;
    state.services.orders.ensure_exists(id).await?;

    let order = state.services.orders.update(id, payload.decode()?).await?;
    Ok(Json(order))
}

#[utoipa::path(
    delete,
    path = "/orders/{id}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order deleted", body = String),
        (status = 404, description = "Order not found")
    )
)]
pub async fn delete_order(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<Json<String>> {
    claims.require_admin()?;

    state.services.orders.delete(id).await?;
    Ok(Json(format!("Successfully deleted order {}", id)))
}
