use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 失敗の分類
///
/// リモート呼び出しの向こう側でメッセージを解析せずに分岐できるようにする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 書籍・貸出が存在しない
    NotFound,
    /// ビジネスルール違反（在庫なし、貸出中の重複）
    BusinessRule,
    /// ストア障害またはデータ破損
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::BusinessRule => "business_rule",
            ErrorKind::StorageFailure => "storage_failure",
        }
    }
}

/// 貸出エンジンのエラー
#[derive(Debug, Error)]
pub enum LendingError {
    /// ISBNに一致する書籍がない
    #[error("book not found")]
    BookNotFound,

    /// タイトルに一致する書籍がない
    #[error("book not found by title")]
    TitleNotFound,

    /// 貸出可能な冊数がない
    #[error("no copies available")]
    NoCopiesAvailable,

    /// タイトルで選ばれた書籍に貸出可能な冊数がない
    #[error("no copies available for that title")]
    NoCopiesAvailableForTitle,

    /// 同じ利用者が同じ書籍を既に借りている
    #[error("borrower already has an active loan for this book")]
    ActiveLoanExists,

    /// 返却対象の貸出がない
    #[error("no active loan found")]
    NoActiveLoan,

    /// 蔵書数の不変条件が破れている（データ破損）
    #[error("catalog invariant violated: {0}")]
    InvariantViolation(String),

    /// ストアのエラー
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LendingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LendingError::BookNotFound | LendingError::TitleNotFound | LendingError::NoActiveLoan => {
                ErrorKind::NotFound
            }
            LendingError::NoCopiesAvailable
            | LendingError::NoCopiesAvailableForTitle
            | LendingError::ActiveLoanExists => ErrorKind::BusinessRule,
            LendingError::InvariantViolation(_) | LendingError::Storage(_) => {
                ErrorKind::StorageFailure
            }
        }
    }

    /// 呼び出し側に見せるメッセージ
    ///
    /// ストア障害の詳細はログにのみ残し、ここでは一般的な文言を返す。
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::StorageFailure => "internal storage error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LendingError>;
