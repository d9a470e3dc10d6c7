use crate::domain::{BorrowerId, Isbn, Loan, LoanId, NewLoan};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 貸出台帳ポート
///
/// 貸出記録は追記と返却フラグの更新のみ。削除はしない。
#[async_trait]
pub trait LoanLedger: Send {
    /// 貸出記録を挿入し、採番されたIDを含む行を返す
    async fn insert_loan(&mut self, new_loan: NewLoan) -> Result<Loan>;

    /// (isbn, borrower)に一致する未返却の貸出のうち最も古いものを取得する
    async fn find_active_loan(
        &mut self,
        isbn: &Isbn,
        borrower_id: &BorrowerId,
    ) -> Result<Option<Loan>>;

    /// 貸出を返却済みにする
    async fn mark_returned(&mut self, loan_id: LoanId) -> Result<()>;
}
