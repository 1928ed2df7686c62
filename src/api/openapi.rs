//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, items, loans, orders, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bibliotheca API",
        version = "1.0.0",
        description = "Library catalog, loan and shop REST API"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Users
        users::login,
        users::list_users,
        users::get_user,
        users::get_user_loans,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Books
        books::list_books,
        books::search_books,
        books::book_popularity,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Loans
        loans::list_loans,
        loans::get_loan,
        loans::create_loan,
        loans::update_loan,
        loans::delete_loan,
        loans::add_book,
        loans::remove_book,
        // Items
        items::list_items,
        items::get_item,
        items::create_item,
        items::update_item,
        items::delete_item,
        // Orders
        orders::list_orders,
        orders::get_order,
        orders::create_order,
        orders::update_order,
        orders::delete_order,
    ),
    components(
        schemas(
            crate::auth::Role,
            users::LoginResponse,
            crate::models::LoginRequest,
            crate::models::User,
            crate::models::UserPayload,
            crate::models::Book,
            crate::models::BookPayload,
            crate::models::BookPopularity,
            crate::models::Loan,
            crate::models::LoanPayload,
            crate::models::Item,
            crate::models::ItemPayload,
            crate::models::Order,
            crate::models::OrderPayload,
            health::HealthResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User management and login"),
        (name = "books", description = "Book catalog"),
        (name = "loans", description = "Loan management"),
        (name = "items", description = "Shop items"),
        (name = "orders", description = "Shop orders")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
