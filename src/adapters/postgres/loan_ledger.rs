use crate::domain::{BorrowerId, Isbn, Loan, LoanId, NewLoan, loan::LoanStatus};
use crate::ports::loan_ledger::{LoanLedger, Result};
use async_trait::async_trait;
use sqlx::{Row, postgres::PgRow};

use super::lending_store::Transaction;

/// PostgreSQLの行データをLoanに変換する
fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let invalid = |e: String| {
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            as Box<dyn std::error::Error + Send + Sync>
    };

    let isbn: String = row.try_get("isbn")?;
    let borrower_id: String = row.try_get("borrower_id")?;
    let returned: bool = row.try_get("returned")?;

    Ok(Loan {
        loan_id: LoanId::new(row.try_get("id")?),
        isbn: Isbn::new(isbn).map_err(|e| invalid(e.to_string()))?,
        borrower_id: BorrowerId::new(borrower_id).map_err(|e| invalid(e.to_string()))?,
        loan_date: row.try_get("loan_date")?,
        due_date: row.try_get("due_date")?,
        status: LoanStatus::from_returned(returned),
    })
}

#[async_trait]
impl LoanLedger for Transaction {
    async fn insert_loan(&mut self, new_loan: NewLoan) -> Result<Loan> {
        let loan_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO loans (isbn, borrower_id, loan_date, due_date, returned)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING id
            "#,
        )
        .bind(new_loan.isbn.as_str())
        .bind(new_loan.borrower_id.as_str())
        .bind(new_loan.loan_date)
        .bind(new_loan.due_date)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(Loan::from_new(LoanId::new(loan_id), new_loan))
    }

    /// (isbn, borrower_id) WHERE NOT returned の部分インデックスを使用
    async fn find_active_loan(
        &mut self,
        isbn: &Isbn,
        borrower_id: &BorrowerId,
    ) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT id, isbn, borrower_id, loan_date, due_date, returned
            FROM loans
            WHERE isbn = $1 AND borrower_id = $2 AND NOT returned
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(isbn.as_str())
        .bind(borrower_id.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn mark_returned(&mut self, loan_id: LoanId) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE loans
            SET returned = TRUE
            WHERE id = $1 AND NOT returned
            "#,
        )
        .bind(loan_id.value())
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(format!("loan {} not found or already returned", loan_id.value()).into());
        }
        Ok(())
    }
}
