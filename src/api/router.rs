use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_loan_by_isbn, create_loan_by_title, create_return, get_book,
};

/// Creates the API router exposing the four lending operations
///
/// Query endpoint:
/// - GET /books/:isbn - Availability of a book
///
/// Command endpoints:
/// - POST /loans/by-isbn - Loan a book by ISBN
/// - POST /loans/by-title - Loan a book by title
/// - POST /returns - Return a book
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        .route("/books/:isbn", get(get_book))
        .route("/loans/by-isbn", post(create_loan_by_isbn))
        .route("/loans/by-title", post(create_loan_by_title))
        .route("/returns", post(create_return))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
