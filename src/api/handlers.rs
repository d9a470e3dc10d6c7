use crate::application::lending::{
    LoanResponse, QueryResponse, ReturnResponse, ServiceDependencies,
    loan_by_isbn as execute_loan_by_isbn, loan_by_title as execute_loan_by_title,
    query_by_isbn as execute_query_by_isbn, return_book as execute_return_book,
};
use crate::domain::Isbn;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;

use super::{
    error::{ApiError, status_for},
    types::{LoanByIsbnRequest, LoanByTitleRequest, ReturnBookRequest},
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /books/:isbn - 貸出状況の照会
///
/// 存在しないISBNは`found: false`で200を返す。
/// ストア障害のみ500になる。
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> Result<Json<QueryResponse>, ApiError> {
    let isbn = Isbn::new(isbn)?;
    let book = execute_query_by_isbn(&state.service_deps, &isbn).await?;
    Ok(Json(QueryResponse::from(book)))
}

// ============================================================================
// Command handlers (POST)
// ============================================================================

/// POST /loans/by-isbn - ISBNを指定して貸出
///
/// 成功時は201。失敗時も本文は`LoanResponse`で、ステータスはエラー種別による。
pub async fn create_loan_by_isbn(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoanByIsbnRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let cmd = req.to_command(Utc::now().date_naive())?;
    let result = execute_loan_by_isbn(&state.service_deps, cmd).await;

    Ok((
        status_for(&result, StatusCode::CREATED),
        Json(LoanResponse::by_isbn(&result)),
    ))
}

/// POST /loans/by-title - タイトルを指定して貸出
pub async fn create_loan_by_title(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoanByTitleRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let cmd = req.to_command(Utc::now().date_naive())?;
    let result = execute_loan_by_title(&state.service_deps, cmd).await;

    Ok((
        status_for(&result, StatusCode::CREATED),
        Json(LoanResponse::by_title(&result)),
    ))
}

/// POST /returns - 書籍を返却
pub async fn create_return(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ReturnBookRequest>,
) -> Result<(StatusCode, Json<ReturnResponse>), ApiError> {
    let cmd = req.to_command()?;
    let result = execute_return_book(&state.service_deps, cmd).await;

    Ok((
        status_for(&result, StatusCode::OK),
        Json(ReturnResponse::from(&result)),
    ))
}
