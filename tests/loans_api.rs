//! Loan and loan/book association tests

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_loan_with_books() {
    let app = TestApp::spawn().await;
    let first = app.create_book("First").await;
    let second = app.create_book("Second").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/loans",
            Some(&app.admin_token),
            Some(json!({
                "user_id": app.user_id,
                "loan_date": "2024-03-01",
                "deadline": "2024-03-21",
                "book_ids": [second, first, second],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], app.user_id);
    assert_eq!(body["loan_date"], "2024-03-01");
    assert_eq!(body["return_date"], serde_json::Value::Null);
    let mut books: Vec<i64> = body["book_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();
    books.sort_unstable();
    assert_eq!(books, vec![first, second]);
}

#[tokio::test]
async fn loan_references_must_exist() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/loans",
            Some(&app.admin_token),
            Some(json!({ "user_id": 999, "book_ids": [41, 42] })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["user_id"].is_array());
    assert_eq!(body["book_ids"], json!(["Unknown book id(s): 41, 42."]));

    let (_, listing) = app.get("/loans").await;
    assert_eq!(listing, json!([]));
}

#[tokio::test]
async fn deadline_cannot_precede_loan_date() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/loans",
            Some(&app.admin_token),
            Some(json!({
                "user_id": app.user_id,
                "loan_date": "2024-03-10",
                "deadline": "2024-03-01",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["deadline"].is_array());
}

#[tokio::test]
async fn loan_mutations_require_admin() {
    let app = TestApp::spawn().await;
    let loan = app.create_loan(app.user_id, &[]).await;
    let book = app.create_book("Guarded").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/loans",
            Some(&app.user_token),
            Some(json!({ "user_id": app.user_id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/loans/{}/add-book/{}", loan, book),
            Some(&app.user_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::DELETE, &format!("/loans/{}", loan), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn add_and_remove_books() {
    let app = TestApp::spawn().await;
    let book = app.create_book("Shared").await;
    let loan = app.create_loan(app.user_id, &[]).await;
    let add = format!("/loans/{}/add-book/{}", loan, book);
    let remove = format!("/loans/{}/remove-book/{}", loan, book);

    let (status, body) = app.send(Method::PUT, &add, Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book_ids"], json!([book]));

    let (status, _) = app.send(Method::PUT, &add, Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.send(Method::PUT, &remove, Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book_ids"], json!([]));

    let (status, _) = app.send(Method::PUT, &remove, Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_book_checks_both_sides_exist() {
    let app = TestApp::spawn().await;
    let book = app.create_book("Real").await;
    let loan = app.create_loan(app.user_id, &[]).await;

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/loans/{}/add-book/999", loan),
            Some(&app.admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/loans/999/add-book/{}", book),
            Some(&app.admin_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_replaces_books_and_dates() {
    let app = TestApp::spawn().await;
    let old = app.create_book("Old").await;
    let new = app.create_book("New").await;
    let loan = app.create_loan(app.user_id, &[old]).await;
    let uri = format!("/loans/{}", loan);

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&app.admin_token),
            Some(json!({
                "user_id": app.user_id,
                "return_date": "2024-02-01",
                "book_ids": [new],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book_ids"], json!([new]));
    assert_eq!(body["loan_date"], serde_json::Value::Null);
    assert_eq!(body["return_date"], "2024-02-01");

    let (_, fetched) = app.get(&uri).await;
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn update_unknown_loan_is_not_found() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .send(Method::PUT, "/loans/999", Some(&app.admin_token), Some(json!({})))
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_loan_releases_its_books() {
    let app = TestApp::spawn().await;
    let book = app.create_book("Returned").await;
    let loan = app.create_loan(app.user_id, &[book]).await;

    let (status, body) = app
        .send(Method::DELETE, &format!("/loans/{}", loan), Some(&app.admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(format!("Successfully deleted loan {}", loan)));

    let (status, _) = app.get(&format!("/loans/{}", loan)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::DELETE, &format!("/books/{}", book), Some(&app.admin_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn list_includes_book_ids() {
    let app = TestApp::spawn().await;
    let book = app.create_book("Listed").await;
    let with_book = app.create_loan(app.user_id, &[book]).await;
    let empty = app.create_loan(app.user_id, &[]).await;

    let (status, body) = app.get("/loans").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], with_book);
    assert_eq!(body[0]["book_ids"], json!([book]));
    assert_eq!(body[1]["id"], empty);
    assert_eq!(body[1]["book_ids"], json!([]));

    let (_, page) = app.get("/loans?per_page=1&page=2").await;
    assert_eq!(page["total"], 2);
    assert_eq!(page["items"][0]["id"], empty);
}

#[tokio::test]
async fn listing_scales_past_the_bind_parameter_limit() {
    let app = TestApp::spawn().await;
    let book = app.create_book("Popular").await;
    let first = app.create_loan(app.user_id, &[book]).await;

    sqlx::query(
        r#"
        WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 40000)
        INSERT INTO loans (user_id) SELECT ? FROM seq
        "#,
    )
    .bind(app.user_id)
    .execute(app.state.services.repository.pool())
    .await
    .unwrap();

    let (status, body) = app.get("/loans").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 40001);
    assert_eq!(body[0]["id"], first);
    assert_eq!(body[0]["book_ids"], json!([book]));
    assert_eq!(body[1]["book_ids"], json!([]));

    let (status, body) = app.get(&format!("/users/{}/loans", app.user_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 40001);
    assert_eq!(body[0]["book_ids"], json!([book]));

    let (status, page) = app.get("/loans?page=2&per_page=100").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 40001);
    assert_eq!(page["items"].as_array().unwrap().len(), 100);
}
