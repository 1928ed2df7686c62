//! Book endpoint tests

mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::{json, Value};

fn sample() -> Value {
    json!({
        "title": "New Book",
        "genre": "Nonfiction",
        "age_category": "Teen",
        "publish_date": "2022-05-10",
        "author": "New Author",
    })
}

#[tokio::test]
async fn admin_creates_book() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send(Method::POST, "/books", Some(&app.admin_token), Some(sample()))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "New Book");
    assert!(body["id"].as_i64().is_some());
}

#[tokio::test]
async fn created_book_reads_back_unchanged() {
    let app = TestApp::spawn().await;
    let (_, created) = app
        .send(Method::POST, "/books", Some(&app.admin_token), Some(sample()))
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app.get(&format!("/books/{}", id)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "New Book");
    assert_eq!(body["genre"], "Nonfiction");
    assert_eq!(body["age_category"], "Teen");
    assert_eq!(body["publish_date"], "2022-05-10");
    assert_eq!(body["author"], "New Author");
}

#[tokio::test]
async fn mutations_require_admin() {
    let app = TestApp::spawn().await;
    let id = app.create_book("Guarded").await;
    let uri = format!("/books/{}", id);

    let cases = [
        (Method::POST, "/books".to_string(), Some(sample())),
        (Method::PUT, uri.clone(), Some(sample())),
        (Method::DELETE, uri.clone(), None),
    ];

    for (method, uri, body) in cases {
        let (status, _) = app.send(method.clone(), &uri, None, body.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {} without token", method, uri);

        let (status, _) = app
            .send(method.clone(), &uri, Some(&app.user_token), body)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{} {} as user", method, uri);
    }

    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rejects_garbage_bearer_token() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send(Method::POST, "/books", Some("not-a-token"), Some(sample()))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthenticated");
}

#[tokio::test]
async fn missing_required_fields_are_named() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/books",
            Some(&app.admin_token),
            Some(json!({ "author": "Nobody" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["title", "genre", "age_category"] {
        assert!(body[field].is_array(), "expected error for {}: {}", field, body);
    }

    let (_, listing) = app.get("/books").await;
    assert_eq!(listing, json!([]));
}

#[tokio::test]
async fn invalid_date_is_rejected() {
    let app = TestApp::spawn().await;
    let mut payload = sample();
    payload["publish_date"] = json!("01/02/2023");

    let (status, body) = app
        .send(Method::POST, "/books", Some(&app.admin_token), Some(payload))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["publish_date"], json!(["Not a valid date."]));
}

#[tokio::test]
async fn malformed_body_is_reported_under_schema() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send_raw(Method::POST, "/books", Some(&app.admin_token), Some("{not json"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["_schema"].is_array());

    let (status, body) = app
        .send(
            Method::POST,
            "/books",
            Some(&app.admin_token),
            Some(json!({ "title": 42, "genre": "x", "age_category": "y" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["_schema"].is_array());
}

#[tokio::test]
async fn duplicate_title_is_a_field_error() {
    let app = TestApp::spawn().await;
    app.create_book("New Book").await;

    let (status, body) = app
        .send(Method::POST, "/books", Some(&app.admin_token), Some(sample()))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["title"].is_array());
}

#[tokio::test]
async fn update_unknown_id_is_not_found_whatever_the_payload() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .send(
            Method::PUT,
            "/books/999",
            Some(&app.admin_token),
            Some(json!({ "publish_date": "garbage" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send_raw(Method::PUT, "/books/999", Some(&app.admin_token), Some("]["))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_replaces_every_field() {
    let app = TestApp::spawn().await;
    let (_, created) = app
        .send(Method::POST, "/books", Some(&app.admin_token), Some(sample()))
        .await;
    let uri = format!("/books/{}", created["id"]);

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&app.admin_token),
            Some(json!({ "title": "Renamed", "genre": "Poetry", "age_category": "Teen" })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Renamed");
    assert_eq!(body["author"], Value::Null);
    assert_eq!(body["publish_date"], Value::Null);

    let (_, fetched) = app.get(&uri).await;
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn update_validation_failure_leaves_record_untouched() {
    let app = TestApp::spawn().await;
    let id = app.create_book("Stable").await;
    let uri = format!("/books/{}", id);

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&app.admin_token), Some(json!({ "title": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["genre"].is_array());

    let (_, fetched) = app.get(&uri).await;
    assert_eq!(fetched["title"], "Stable");
}

#[tokio::test]
async fn delete_twice_is_not_found() {
    let app = TestApp::spawn().await;
    let id = app.create_book("Ephemeral").await;
    let uri = format!("/books/{}", id);

    let (status, body) = app.send(Method::DELETE, &uri, Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(format!("Successfully deleted book {}", id)));

    let (status, _) = app.send(Method::DELETE, &uri, Some(&app.admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn book_on_a_loan_cannot_be_deleted() {
    let app = TestApp::spawn().await;
    let book = app.create_book("Borrowed").await;
    app.create_loan(app.user_id, &[book]).await;

    let (status, _) = app
        .send(Method::DELETE, &format!("/books/{}", book), Some(&app.admin_token), None)
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn search_without_match_is_empty() {
    let app = TestApp::spawn().await;
    app.create_book("Something").await;

    let (status, body) = app.get("/books/search?title=Nonexistent").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn search_is_case_insensitive_substring() {
    let app = TestApp::spawn().await;
    app.create_book("The Rust Programming Language").await;
    app.create_book("Rusty Nails").await;
    app.create_book("Gardening").await;

    let (status, body) = app.get("/books/search?title=rUsT").await;

    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["The Rust Programming Language", "Rusty Nails"]);
}

#[tokio::test]
async fn search_requires_title() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/books/search").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["title"].is_array());
}

#[tokio::test]
async fn popularity_ranks_by_loan_count() {
    let app = TestApp::spawn().await;
    let quiet = app.create_book("Quiet").await;
    let popular = app.create_book("Popular").await;
    let middling = app.create_book("Middling").await;

    app.create_loan(app.user_id, &[popular, middling]).await;
    app.create_loan(app.user_id, &[popular]).await;

    let (status, body) = app.get("/books/popularity").await;

    assert_eq!(status, StatusCode::OK);
    let ranking: Vec<(i64, i64)> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| (b["id"].as_i64().unwrap(), b["loan_count"].as_i64().unwrap()))
        .collect();
    assert_eq!(ranking, vec![(popular, 2), (middling, 1), (quiet, 0)]);
}

#[tokio::test]
async fn list_is_bare_without_pagination_params() {
    let app = TestApp::spawn().await;
    let first = app.create_book("First").await;
    let second = app.create_book("Second").await;

    let (status, body) = app.get("/books").await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![first, second]);
}

#[tokio::test]
async fn list_pages_when_asked() {
    let app = TestApp::spawn().await;
    for n in 0..5 {
        app.create_book(&format!("Volume {}", n)).await;
    }

    let (status, body) = app.get("/books?page=2&per_page=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["page"], 2);
    assert_eq!(body["per_page"], 2);
    assert_eq!(body["pages"], 3);
    let titles: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Volume 2", "Volume 3"]);

    let (_, body) = app.get("/books?per_page=500").await;
    assert_eq!(body["per_page"], 100);
    assert_eq!(body["page"], 1);
}

#[tokio::test]
async fn first_page_of_one() {
    let app = TestApp::spawn().await;
    app.create_book("One").await;
    app.create_book("Two").await;

    let (status, body) = app.get("/books?page=1&per_page=1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["title"], "One");
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn huge_page_number_is_a_field_error() {
    let app = TestApp::spawn().await;
    app.create_book("Only").await;

    for resource in ["books", "users", "loans", "items", "orders"] {
        let (status, body) = app
            .get(&format!("/{}?page=9223372036854775807&per_page=2", resource))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "/{}", resource);
        assert_eq!(body["page"], json!(["Too large."]));
    }
}

#[tokio::test]
async fn list_rejects_bad_pagination() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get("/books?page=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["page"].is_array());

    let (status, body) = app.get("/books?per_page=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["_schema"].is_array());
}

#[tokio::test]
async fn whitespace_only_title_is_rejected() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/books",
            Some(&app.admin_token),
            Some(json!({ "title": "   ", "genre": "Fiction", "age_category": "Adult" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["title"].is_array());

    let (status, body) = app
        .send(
            Method::POST,
            "/books",
            Some(&app.admin_token),
            Some(json!({ "title": " Padded ", "genre": "Fiction", "age_category": "Adult" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Padded");
}
