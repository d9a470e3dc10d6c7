use crate::application::lending::{ErrorKind, LendingError};
use crate::domain::ValueError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// エラー種別からHTTPステータスを決める
///
/// - 404 Not Found - 書籍・貸出が存在しない
/// - 422 Unprocessable Entity - ビジネスルール違反
/// - 500 Internal Server Error - ストア障害
pub fn status_for_kind(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::BusinessRule => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// 操作結果からHTTPステータスを決める
pub fn status_for<T>(result: &Result<T, LendingError>, success: StatusCode) -> StatusCode {
    match result {
        Ok(_) => success,
        Err(err) => status_for_kind(err.kind()),
    }
}

/// API層のエラー型
///
/// 貸出・返却の失敗は値オブジェクトとして返すため、ここに来るのは
/// 入力値の不正と照会時のストア障害のみ。
#[derive(Debug)]
pub enum ApiError {
    BadRequest(ValueError),
    Lending(LendingError),
}

impl From<ValueError> for ApiError {
    fn from(err: ValueError) -> Self {
        ApiError::BadRequest(err)
    }
}

impl From<LendingError> for ApiError {
    fn from(err: LendingError) -> Self {
        ApiError::Lending(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(err) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("bad_request", err.to_string()),
            ),
            // 内部エラーの詳細はエンジン側でログに記録済み。クライアントには一般的なメッセージのみを返す
            ApiError::Lending(err) => (
                status_for_kind(err.kind()),
                ErrorResponse::new(err.kind().as_str(), err.public_message()),
            ),
        };

        (status, Json(body)).into_response()
    }
}
