use crate::domain::{
    BookTitle, BorrowerId, Isbn, ValueError,
    commands::{LoanByIsbn, LoanByTitle, ReturnBook},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// ISBN指定の貸出リクエスト（POST /loans/by-isbn）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanByIsbnRequest {
    pub isbn: String,
    pub user_id: String,
}

impl LoanByIsbnRequest {
    pub fn to_command(&self, requested_on: NaiveDate) -> Result<LoanByIsbn, ValueError> {
        Ok(LoanByIsbn {
            isbn: Isbn::new(self.isbn.as_str())?,
            borrower_id: BorrowerId::new(self.user_id.as_str())?,
            requested_on,
        })
    }
}

/// タイトル指定の貸出リクエスト（POST /loans/by-title）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanByTitleRequest {
    pub title: String,
    pub user_id: String,
}

impl LoanByTitleRequest {
    pub fn to_command(&self, requested_on: NaiveDate) -> Result<LoanByTitle, ValueError> {
        Ok(LoanByTitle {
            title: BookTitle::new(self.title.as_str())?,
            borrower_id: BorrowerId::new(self.user_id.as_str())?,
            requested_on,
        })
    }
}

/// 返却リクエスト（POST /returns）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnBookRequest {
    pub isbn: String,
    pub user_id: String,
}

impl ReturnBookRequest {
    pub fn to_command(&self) -> Result<ReturnBook, ValueError> {
        Ok(ReturnBook {
            isbn: Isbn::new(self.isbn.as_str())?,
            borrower_id: BorrowerId::new(self.user_id.as_str())?,
        })
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
