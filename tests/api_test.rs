use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use rusty_library_lending::adapters::memory::InMemoryLendingStore;
use rusty_library_lending::api::handlers::AppState;
use rusty_library_lending::api::router::create_router;
use rusty_library_lending::application::lending::ServiceDependencies;
use rusty_library_lending::domain::{Isbn, LOAN_PERIOD_DAYS};
use rusty_library_lending::ports::{LendingStore, LendingTransaction, lending_store};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

mod common;

// ============================================================================
// APIテスト用のヘルパー関数
// ============================================================================

/// インメモリストアでルーターを組み立てる
fn setup_app(store: Arc<dyn LendingStore>) -> axum::Router {
    let service_deps = ServiceDependencies::new(store);
    create_router(Arc::new(AppState { service_deps }))
}

fn setup_memory_app() -> (InMemoryLendingStore, axum::Router) {
    let store = InMemoryLendingStore::new();
    store.add_book(common::book("111", "Dune", 2, 2));
    store.add_book(common::book("222", "Dune", 5, 4));
    store.add_book(common::book("333", "Emma", 1, 0));
    let app = setup_app(Arc::new(store.clone()));
    (store, app)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

async fn post(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
    )
    .await
}

/// 常にトランザクション開始に失敗するストア
struct UnavailableStore;

#[async_trait]
impl LendingStore for UnavailableStore {
    async fn begin(&self) -> lending_store::Result<Box<dyn LendingTransaction>> {
        Err("connection refused".into())
    }
}

// ============================================================================
// 照会
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (_, app) = setup_memory_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_get_book_found() {
    let (_, app) = setup_memory_app();

    let (status, body) = get(&app, "/books/222").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "found": true,
            "title": "Dune",
            "totalCopies": 5,
            "availableCopies": 4,
        })
    );
}

#[tokio::test]
async fn test_get_book_not_found_is_ok() {
    let (_, app) = setup_memory_app();

    let (status, body) = get(&app, "/books/999").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], json!(false));
    assert_eq!(body["totalCopies"], json!(0));
    assert_eq!(body["availableCopies"], json!(0));
}

#[tokio::test]
async fn test_get_book_storage_failure() {
    let app = setup_app(Arc::new(UnavailableStore));

    let (status, body) = get(&app, "/books/111").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("storage_failure"));
    // 内部の詳細は返さない
    assert_eq!(body["message"], json!("internal storage error"));
}

// ============================================================================
// 貸出
// ============================================================================

#[tokio::test]
async fn test_loan_by_isbn_created() {
    let (store, app) = setup_memory_app();

    let (status, body) = post(
        &app,
        "/loans/by-isbn",
        json!({ "isbn": "111", "userId": "alice" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("loan confirmed"));
    assert!(body.get("errorKind").is_none());

    let loan = &store.loans()[0];
    assert_eq!(body["dueDate"], json!(loan.due_date.to_string()));
    assert_eq!(
        (loan.due_date - loan.loan_date).num_days(),
        LOAN_PERIOD_DAYS as i64
    );
    assert!(loan.loan_date <= Utc::now().date_naive());

    let book = store.book(&Isbn::new("111").unwrap()).unwrap();
    assert_eq!(book.copies.available(), 1);
}

#[tokio::test]
async fn test_loan_by_isbn_no_copies() {
    let (store, app) = setup_memory_app();

    let (status, body) = post(
        &app,
        "/loans/by-isbn",
        json!({ "isbn": "333", "userId": "alice" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body,
        json!({
            "success": false,
            "message": "no copies available",
            "errorKind": "business_rule",
        })
    );
    assert!(store.loans().is_empty());
}

#[tokio::test]
async fn test_loan_by_isbn_unknown_book() {
    let (_, app) = setup_memory_app();

    let (status, body) = post(
        &app,
        "/loans/by-isbn",
        json!({ "isbn": "999", "userId": "alice" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("book not found"));
    assert_eq!(body["errorKind"], json!("not_found"));
}

#[tokio::test]
async fn test_loan_with_blank_user_is_bad_request() {
    let (store, app) = setup_memory_app();

    let (status, body) = post(
        &app,
        "/loans/by-isbn",
        json!({ "isbn": "111", "userId": "   " }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("bad_request"));
    assert!(store.loans().is_empty());
}

#[tokio::test]
async fn test_loan_by_title_picks_most_available() {
    let (store, app) = setup_memory_app();

    let (status, body) = post(
        &app,
        "/loans/by-title",
        json!({ "title": "Dune", "userId": "alice" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], json!("loan confirmed (by title)"));

    let loans = store.loans();
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].isbn.as_str(), "222");
}

#[tokio::test]
async fn test_loan_by_title_failures() {
    let (_, app) = setup_memory_app();

    let (status, body) = post(
        &app,
        "/loans/by-title",
        json!({ "title": "Ulysses", "userId": "alice" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("book not found by title"));

    let (status, body) = post(
        &app,
        "/loans/by-title",
        json!({ "title": "Emma", "userId": "alice" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], json!("no copies available for that title"));

    let (status, _) = post(
        &app,
        "/loans/by-title",
        json!({ "title": "", "userId": "alice" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_loan_storage_failure_hides_details() {
    let app = setup_app(Arc::new(UnavailableStore));

    let (status, body) = post(
        &app,
        "/loans/by-isbn",
        json!({ "isbn": "111", "userId": "alice" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({
            "success": false,
            "message": "internal storage error",
            "errorKind": "storage_failure",
        })
    );
}

// ============================================================================
// 返却
// ============================================================================

#[tokio::test]
async fn test_loan_then_return_flow() {
    let (store, app) = setup_memory_app();

    let (status, _) = post(
        &app,
        "/loans/by-isbn",
        json!({ "isbn": "111", "userId": "alice" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = get(&app, "/books/111").await;
    assert_eq!(body["availableCopies"], json!(1));

    let (status, body) = post(&app, "/returns", json!({ "isbn": "111", "userId": "alice" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "success": true, "message": "return registered" })
    );

    let (_, body) = get(&app, "/books/111").await;
    assert_eq!(body["availableCopies"], json!(2));
    assert!(store.loans().iter().all(|loan| !loan.is_active()));

    // 2回目の返却は失敗
    let (status, body) = post(&app, "/returns", json!({ "isbn": "111", "userId": "alice" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("no active loan found"));
    assert_eq!(body["errorKind"], json!("not_found"));
}

#[tokio::test]
async fn test_return_with_blank_isbn_is_bad_request() {
    let (_, app) = setup_memory_app();

    let (status, body) = post(&app, "/returns", json!({ "isbn": " ", "userId": "alice" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("bad_request"));
}
