use crate::domain::{self, Book, BorrowerId, Isbn, Loan, commands::*};
use crate::ports::{LendingStore, LendingTransaction};
use chrono::NaiveDate;
use std::sync::Arc;

use super::errors::{ErrorKind, LendingError, Result};
use super::isbn_locks::IsbnLocks;

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞いは持たず、以下の関数に引数として渡す。
///
/// # 並行性
///
/// 貸出・返却はISBNごとのロックで直列化される。
/// ロックはトランザクション開始前に取得し、commit/rollback後に解放する。
/// 1つの操作が2つ以上のISBNロックを持つことはない。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub store: Arc<dyn LendingStore>,
    pub isbn_locks: Arc<IsbnLocks>,
}

impl ServiceDependencies {
    pub fn new(store: Arc<dyn LendingStore>) -> Self {
        Self {
            store,
            isbn_locks: Arc::new(IsbnLocks::new()),
        }
    }
}

/// 貸出の指定方法（失敗時のエラーが異なる）
#[derive(Debug, Clone, Copy)]
enum LoanVia {
    Isbn,
    Title,
}

impl LoanVia {
    fn missing(self) -> LendingError {
        match self {
            LoanVia::Isbn => LendingError::BookNotFound,
            LoanVia::Title => LendingError::TitleNotFound,
        }
    }

    fn exhausted(self) -> LendingError {
        match self {
            LoanVia::Isbn => LendingError::NoCopiesAvailable,
            LoanVia::Title => LendingError::NoCopiesAvailableForTitle,
        }
    }
}

async fn begin(deps: &ServiceDependencies) -> Result<Box<dyn LendingTransaction>> {
    deps.store.begin().await.map_err(LendingError::Storage)
}

/// 結果に応じてトランザクションを確定または破棄する
///
/// 失敗時は必ずrollbackしてから元のエラーを返す。
/// rollback自体の失敗はログに残し、元のエラーを優先する。
async fn finish<T>(tx: Box<dyn LendingTransaction>, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await.map_err(LendingError::Storage)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}

/// 失敗をエラー種別に応じたレベルで記録する
fn log_failure(operation: &str, err: &LendingError) {
    match err.kind() {
        ErrorKind::StorageFailure => match std::error::Error::source(err) {
            Some(source) => tracing::error!("{} failed: {}: {}", operation, err, source),
            None => tracing::error!("{} failed: {}", operation, err),
        },
        ErrorKind::NotFound | ErrorKind::BusinessRule => {
            tracing::debug!("{} rejected: {}", operation, err)
        }
    }
}

/// ISBNで書籍の貸出状況を照会する
///
/// 読み取りのみ。ISBNが存在しない場合は`Ok(None)`。
/// ストア障害は`LendingError::Storage`として呼び出し側に返す
/// （「存在しない」と「ストアが使えない」を区別できるようにする）。
#[tracing::instrument(skip_all, fields(isbn = %isbn))]
pub async fn query_by_isbn(deps: &ServiceDependencies, isbn: &Isbn) -> Result<Option<Book>> {
    let result = async {
        let mut tx = begin(deps).await?;
        let found = tx.find_book(isbn).await.map_err(LendingError::Storage);
        finish(tx, found).await
    }
    .await;

    if let Err(ref err) = result {
        log_failure("Query", err);
    }
    result
}

/// ISBNを指定して書籍を貸し出す
///
/// ビジネスルール：
/// - 書籍が存在すること
/// - 貸出可能数が1以上であること
/// - 同じ利用者が同じ書籍を借りていないこと
///
/// 成功時は貸出可能数を1減らし、返却期限7日後の貸出記録を作る。
/// 途中で失敗した場合は何も変更しない。
#[tracing::instrument(skip_all, fields(isbn = %cmd.isbn, borrower = %cmd.borrower_id))]
pub async fn loan_by_isbn(deps: &ServiceDependencies, cmd: LoanByIsbn) -> Result<Loan> {
    let result = lend(
        deps,
        &cmd.isbn,
        &cmd.borrower_id,
        cmd.requested_on,
        LoanVia::Isbn,
    )
    .await;

    match &result {
        Ok(loan) => tracing::info!(
            "Book loaned: loan_id={} due_date={}",
            loan.loan_id.value(),
            loan.due_date
        ),
        Err(err) => log_failure("Loan by ISBN", err),
    }
    result
}

/// タイトルを指定して書籍を貸し出す
///
/// 同じタイトルの書籍が複数ある場合は貸出可能数が最大のもの（同数ならISBN昇順）を選ぶ。
/// 選んだ書籍が貸出不可なら、他の候補を試さずに失敗する。
///
/// タイトルからISBNへの解決は短い読み取りトランザクションで行い、
/// そのISBNのロックを取ってから貸出トランザクションの中で書籍を読み直す。
#[tracing::instrument(skip_all, fields(title = %cmd.title, borrower = %cmd.borrower_id))]
pub async fn loan_by_title(deps: &ServiceDependencies, cmd: LoanByTitle) -> Result<Loan> {
    let result = async {
        let mut tx = begin(deps).await?;
        let found = tx
            .find_best_by_title(&cmd.title)
            .await
            .map_err(LendingError::Storage);
        let book = finish(tx, found).await?.ok_or(LendingError::TitleNotFound)?;

        if !book.copies.can_lend() {
            return Err(LendingError::NoCopiesAvailableForTitle);
        }

        lend(
            deps,
            &book.isbn,
            &cmd.borrower_id,
            cmd.requested_on,
            LoanVia::Title,
        )
        .await
    }
    .await;

    match &result {
        Ok(loan) => tracing::info!(
            "Book loaned by title: isbn={} loan_id={} due_date={}",
            loan.isbn,
            loan.loan_id.value(),
            loan.due_date
        ),
        Err(err) => log_failure("Loan by title", err),
    }
    result
}

/// 書籍を返却する
///
/// ビジネスルール：
/// - (isbn, borrower)に一致する未返却の貸出があること（複数あれば最も古いもの）
/// - 返却によって貸出可能数が蔵書数を超えないこと（超える場合はデータ破損として失敗）
///
/// 成功時は貸出を返却済みにし、貸出可能数を1増やす。
#[tracing::instrument(skip_all, fields(isbn = %cmd.isbn, borrower = %cmd.borrower_id))]
pub async fn return_book(deps: &ServiceDependencies, cmd: ReturnBook) -> Result<Loan> {
    let result = async {
        let _guard = deps.isbn_locks.acquire(&cmd.isbn).await;
        let mut tx = begin(deps).await?;
        let outcome = restock_locked(tx.as_mut(), &cmd.isbn, &cmd.borrower_id).await;
        finish(tx, outcome).await
    }
    .await;

    match &result {
        Ok(loan) => tracing::info!("Book returned: loan_id={}", loan.loan_id.value()),
        Err(err) => log_failure("Return", err),
    }
    result
}

/// ISBNロックを取り、1冊貸し出すトランザクションを実行する
async fn lend(
    deps: &ServiceDependencies,
    isbn: &Isbn,
    borrower_id: &BorrowerId,
    loan_date: NaiveDate,
    via: LoanVia,
) -> Result<Loan> {
    let _guard = deps.isbn_locks.acquire(isbn).await;
    let mut tx = begin(deps).await?;
    let outcome = lend_locked(tx.as_mut(), isbn, borrower_id, loan_date, via).await;
    finish(tx, outcome).await
}

async fn lend_locked(
    tx: &mut dyn LendingTransaction,
    isbn: &Isbn,
    borrower_id: &BorrowerId,
    loan_date: NaiveDate,
    via: LoanVia,
) -> Result<Loan> {
    // 1. 書籍の存在確認（行ロック）
    let book = tx
        .lock_book(isbn)
        .await
        .map_err(LendingError::Storage)?
        .ok_or_else(|| via.missing())?;

    // 2. 貸出可能数の確認
    let lent = domain::book::lend_copy(&book).map_err(|_| via.exhausted())?;

    // 3. 同じ利用者の貸出中の重複確認
    let existing = tx
        .find_active_loan(isbn, borrower_id)
        .await
        .map_err(LendingError::Storage)?;
    if existing.is_some() {
        return Err(LendingError::ActiveLoanExists);
    }

    // 4. 貸出可能数を減らす
    tx.adjust_available(isbn, -1)
        .await
        .map_err(LendingError::Storage)?;
    tracing::debug!(
        "Available copies {} -> {}",
        book.copies.available(),
        lent.copies.available()
    );

    // 5. 貸出記録を作る
    let new_loan = domain::loan::open_loan(isbn.clone(), borrower_id.clone(), loan_date);
    tx.insert_loan(new_loan)
        .await
        .map_err(LendingError::Storage)
}

async fn restock_locked(
    tx: &mut dyn LendingTransaction,
    isbn: &Isbn,
    borrower_id: &BorrowerId,
) -> Result<Loan> {
    // 書籍行を先にロックする（貸出と同じ順序）
    let book = tx.lock_book(isbn).await.map_err(LendingError::Storage)?;

    // 1. 未返却の貸出を探す
    let loan = tx
        .find_active_loan(isbn, borrower_id)
        .await
        .map_err(LendingError::Storage)?
        .ok_or(LendingError::NoActiveLoan)?;

    let returned = domain::loan::close_loan(&loan).map_err(|_| LendingError::NoActiveLoan)?;

    // 貸出記録があるのに書籍がない、または既に全冊揃っている場合はデータ破損
    let book = book.ok_or_else(|| {
        LendingError::InvariantViolation(format!(
            "loan {} references missing book {}",
            loan.loan_id.value(),
            isbn
        ))
    })?;
    domain::book::restock_copy(&book)
        .map_err(|e| LendingError::InvariantViolation(format!("book {}: {}", isbn, e)))?;

    // 2. 返却済みにする
    tx.mark_returned(loan.loan_id)
        .await
        .map_err(LendingError::Storage)?;

    // 3. 貸出可能数を戻す
    tx.adjust_available(isbn, 1)
        .await
        .map_err(LendingError::Storage)?;

    Ok(returned)
}
