use crate::domain::{Book, Loan};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::{ErrorKind, LendingError};

/// 照会結果
///
/// ISBNが存在しない場合は`found = false`で、他の項目は空または0。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub found: bool,
    pub title: String,
    pub total_copies: u32,
    pub available_copies: u32,
}

impl QueryResponse {
    pub fn not_found() -> Self {
        Self {
            found: false,
            title: String::new(),
            total_copies: 0,
            available_copies: 0,
        }
    }
}

impl From<Option<Book>> for QueryResponse {
    fn from(book: Option<Book>) -> Self {
        match book {
            Some(book) => Self {
                found: true,
                title: book.title.into(),
                total_copies: book.copies.total(),
                available_copies: book.copies.available(),
            },
            None => Self::not_found(),
        }
    }
}

/// 貸出結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl LoanResponse {
    pub fn confirmed(loan: &Loan, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            due_date: Some(loan.due_date),
            error_kind: None,
        }
    }

    pub fn failed(err: &LendingError) -> Self {
        Self {
            success: false,
            message: err.public_message(),
            due_date: None,
            error_kind: Some(err.kind()),
        }
    }

    /// ISBN指定の貸出結果から作る
    pub fn by_isbn(result: &Result<Loan, LendingError>) -> Self {
        match result {
            Ok(loan) => Self::confirmed(loan, "loan confirmed"),
            Err(err) => Self::failed(err),
        }
    }

    /// タイトル指定の貸出結果から作る
    pub fn by_title(result: &Result<Loan, LendingError>) -> Self {
        match result {
            Ok(loan) => Self::confirmed(loan, "loan confirmed (by title)"),
            Err(err) => Self::failed(err),
        }
    }
}

/// 返却結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl From<&Result<Loan, LendingError>> for ReturnResponse {
    fn from(result: &Result<Loan, LendingError>) -> Self {
        match result {
            Ok(_) => Self {
                success: true,
                message: "return registered".to_string(),
                error_kind: None,
            },
            Err(err) => Self {
                success: false,
                message: err.public_message(),
                error_kind: Some(err.kind()),
            },
        }
    }
}
