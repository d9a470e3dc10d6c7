use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{BorrowerId, Isbn, LoanId, ReturnBookError};

/// 貸出期間（日数）
pub const LOAN_PERIOD_DAYS: u64 = 7;

/// 貸出の状態
///
/// 状態遷移: (なし) → Active → Returned
/// Returnedは終端。再貸出は新しい貸出記録を作る。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// 貸出中
    Active,
    /// 返却済み
    Returned,
}

impl LoanStatus {
    pub fn from_returned(returned: bool) -> Self {
        if returned {
            LoanStatus::Returned
        } else {
            LoanStatus::Active
        }
    }

    pub fn is_returned(&self) -> bool {
        matches!(self, LoanStatus::Returned)
    }
}

/// 採番前の貸出（台帳に挿入する内容）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLoan {
    pub isbn: Isbn,
    pub borrower_id: BorrowerId,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// 貸出記録 - 1冊を1人に一定期間貸す記録
///
/// 物理削除はしない。返却時はstatusのみ変化する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub loan_id: LoanId,
    pub isbn: Isbn,
    pub borrower_id: BorrowerId,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: LoanStatus,
}

impl Loan {
    /// 採番済みIDを付けて台帳の行にする
    pub fn from_new(loan_id: LoanId, new_loan: NewLoan) -> Self {
        Self {
            loan_id,
            isbn: new_loan.isbn,
            borrower_id: new_loan.borrower_id,
            loan_date: new_loan.loan_date,
            due_date: new_loan.due_date,
            status: LoanStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_returned()
    }
}

/// 返却期限 = 貸出日 + 7日
///
/// 7日後が表現できる最大日付（`NaiveDate::MAX`）を超える場合は`NaiveDate::MAX`で打ち切る。
/// 貸出日は現在日付なので実運用では起こらない。
pub fn due_date_for(loan_date: NaiveDate) -> NaiveDate {
    loan_date
        .checked_add_days(Days::new(LOAN_PERIOD_DAYS))
        .unwrap_or(NaiveDate::MAX)
}

/// 純粋関数：貸出を開始する
///
/// 副作用なし。台帳に挿入する内容を返す。
pub fn open_loan(isbn: Isbn, borrower_id: BorrowerId, loan_date: NaiveDate) -> NewLoan {
    NewLoan {
        isbn,
        borrower_id,
        loan_date,
        due_date: due_date_for(loan_date),
    }
}

/// 純粋関数：貸出を返却済みにする
///
/// 副作用なし。返却済みの新しいLoanを返す。
pub fn close_loan(loan: &Loan) -> Result<Loan, ReturnBookError> {
    if loan.status.is_returned() {
        return Err(ReturnBookError::AlreadyReturned);
    }

    Ok(Loan {
        status: LoanStatus::Returned,
        ..loan.clone()
    })
}
