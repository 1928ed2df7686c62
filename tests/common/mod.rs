//! Shared harness for the HTTP tests
//!
//! Every test gets its own in-memory database, seeded with one admin and one
//! regular user, and drives the real router through `oneshot`.

#![allow(dead_code)]

use std::str::FromStr;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;

use bibliotheca_server::{
    api,
    auth::Role,
    config::AppConfig,
    models::NewUser,
    repository::Repository,
    services::cache::ResponseCache,
    AppState,
};

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub admin_id: i64,
    pub admin_token: String,
    pub user_id: i64,
    pub user_token: String,
}

fn account(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: "password".to_string(),
        dob: None,
        address: None,
        role: None,
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_cache(ResponseCache::disabled()).await
    }

    pub async fn spawn_with_cache(cache: ResponseCache) -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .foreign_keys(true);
        // A single connection that never recycles keeps the in-memory database alive
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .unwrap();

        let repository = Repository::new(pool);
        repository.migrate().await.unwrap();

        let state = AppState::new(AppConfig::default(), repository, cache);

        let admin = state
            .services
            .users
            .provision(account("admin"), Role::Admin)
            .await
            .unwrap();
        let user = state
            .services
            .users
            .provision(account("reader"), Role::User)
            .await
            .unwrap();

        let admin_token = state.tokens.encode(admin.id, Role::Admin).unwrap();
        let user_token = state.tokens.encode(user.id, Role::User).unwrap();

        Self {
            router: api::router(state.clone()),
            state,
            admin_id: admin.id,
            admin_token,
            user_id: user.id,
            user_token,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let raw = body.map(|value| value.to_string());
        self.send_raw(method, uri, token, raw.as_deref()).await
    }

    /// Send a body verbatim, for malformed JSON cases
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    /// Create a book as admin and return its id
    pub async fn create_book(&self, title: &str) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/books",
                Some(&self.admin_token),
                Some(serde_json::json!({
                    "title": title,
                    "genre": "Fiction",
                    "age_category": "Adult",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_i64().unwrap()
    }

    /// Create a loan for `user_id` as admin and return its id
    pub async fn create_loan(&self, user_id: i64, book_ids: &[i64]) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/loans",
                Some(&self.admin_token),
                Some(serde_json::json!({
                    "user_id": user_id,
                    "loan_date": "2024-01-01",
                    "deadline": "2024-01-15",
                    "book_ids": book_ids,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_i64().unwrap()
    }

    /// Create a shop item as admin and return its id
    pub async fn create_item(&self, name: &str, price: f64) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/items",
                Some(&self.admin_token),
                Some(serde_json::json!({ "item_name": name, "price": price })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_i64().unwrap()
    }
}
