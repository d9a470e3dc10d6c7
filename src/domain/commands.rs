use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BookTitle, BorrowerId, Isbn};

/// コマンド：ISBNを指定して貸し出す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanByIsbn {
    pub isbn: Isbn,
    pub borrower_id: BorrowerId,
    /// 貸出日（返却期限の起点）
    pub requested_on: NaiveDate,
}

/// コマンド：タイトルを指定して貸し出す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanByTitle {
    pub title: BookTitle,
    pub borrower_id: BorrowerId,
    pub requested_on: NaiveDate,
}

/// コマンド：書籍を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnBook {
    pub isbn: Isbn,
    pub borrower_id: BorrowerId,
}
