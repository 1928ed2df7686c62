//! Response cache behaviour through the router, over the in-memory store

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use bibliotheca_server::services::cache::{MemoryStore, ResponseCache};
use common::TestApp;
use serde_json::json;

async fn cached_app() -> (Arc<MemoryStore>, TestApp) {
    let store = Arc::new(MemoryStore::new());
    let app = TestApp::spawn_with_cache(ResponseCache::with_store(store.clone(), 300)).await;
    (store, app)
}

fn titles(body: &serde_json::Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn book_writes_refresh_cached_listings() {
    let (store, app) = cached_app().await;
    app.create_book("First").await;

    let (status, body) = app.get("/books").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), vec!["First"]);

    // A row written behind the service's back stays hidden until invalidation
    sqlx::query("INSERT INTO books (title, genre, age_category) VALUES ('Sneaky', 'Drama', 'Adult')")
        .execute(app.state.services.repository.pool())
        .await
        .unwrap();
    let (_, body) = app.get("/books").await;
    assert_eq!(titles(&body), vec!["First"]);

    app.create_book("Second").await;
    assert!(store.keys().iter().all(|k| !k.starts_with("cache:books:")));

    let (_, body) = app.get("/books").await;
    assert_eq!(titles(&body), vec!["First", "Sneaky", "Second"]);
}

#[tokio::test]
async fn query_strings_are_cached_separately() {
    let (store, app) = cached_app().await;
    app.create_book("One").await;
    app.create_book("Two").await;

    let (_, all) = app.get("/books").await;
    let (_, page) = app.get("/books?page=2&per_page=1").await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    assert_eq!(page["items"][0]["title"], "Two");

    let books: Vec<String> = store
        .keys()
        .into_iter()
        .filter(|k| k.starts_with("cache:books:"))
        .collect();
    assert_eq!(books.len(), 2);
}

#[tokio::test]
async fn loan_writes_refresh_popularity_and_user_loans() {
    let (_store, app) = cached_app().await;
    let book = app.create_book("Borrowed").await;
    let user_loans = format!("/users/{}/loans", app.user_id);

    let (_, ranking) = app.get("/books/popularity").await;
    assert_eq!(ranking[0]["loan_count"], 0);
    let (_, loans) = app.get(&user_loans).await;
    assert_eq!(loans, json!([]));

    let loan = app.create_loan(app.user_id, &[book]).await;

    let (_, ranking) = app.get("/books/popularity").await;
    assert_eq!(ranking[0]["loan_count"], 1);
    let (_, loans) = app.get(&user_loans).await;
    assert_eq!(loans[0]["id"], loan);
    assert_eq!(loans[0]["book_ids"], json!([book]));

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/loans/{}/remove-book/{}", loan, book),
            Some(&app.admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, ranking) = app.get("/books/popularity").await;
    assert_eq!(ranking[0]["loan_count"], 0);
    let (_, loans) = app.get(&user_loans).await;
    assert_eq!(loans[0]["book_ids"], json!([]));
}

#[tokio::test]
async fn deletes_and_shop_writes_invalidate_their_resource() {
    let (_store, app) = cached_app().await;
    let item = app.create_item("Lamp", 30.0).await;

    let (_, items) = app.get("/items").await;
    assert_eq!(items.as_array().unwrap().len(), 1);

    let (status, _) = app
        .send(Method::DELETE, &format!("/items/{}", item), Some(&app.admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, items) = app.get("/items").await;
    assert_eq!(items, json!([]));
}

#[tokio::test]
async fn errors_are_not_cached() {
    let (store, app) = cached_app().await;

    let (status, _) = app.get("/users/999/loans").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(store.keys().iter().all(|k| !k.starts_with("cache:users:")));
}
