use crate::domain::{
    Availability, Book, BookTitle, BorrowerId, Isbn, Loan, LoanId, NewLoan, loan::LoanStatus,
};
use crate::ports::catalog_store::{self, CatalogStore};
use crate::ports::lending_store::{self, LendingStore as LendingStoreTrait, LendingTransaction};
use crate::ports::loan_ledger::{self, LoanLedger};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// インメモリストアのエラー
#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("book {0} not found")]
    BookNotFound(Isbn),

    #[error("loan {0} not found or already returned")]
    LoanNotActive(i64),

    #[error("available copies of {isbn} out of range (total={total}, available={available})")]
    OutOfRange {
        isbn: Isbn,
        total: u32,
        available: i64,
    },
}

/// 共有テーブル（コミット済みの状態）
#[derive(Debug, Default)]
struct Tables {
    books: BTreeMap<Isbn, Book>,
    loans: BTreeMap<LoanId, Loan>,
    last_loan_id: i64,
}

fn lock(tables: &Mutex<Tables>) -> MutexGuard<'_, Tables> {
    tables.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 貸出ストアのインメモリ実装
///
/// テストとローカル実行用。
/// トランザクション中の書き込みは手元に溜めておき、commit時にまとめて反映する。
/// 読み取りはコミット済みの最新状態に自分の未確定の変更を重ねたものを返す（read committed相当）。
/// 行ロックは持たないため、同じ書籍への操作の直列化は貸出エンジンのISBNロックに任せる。
#[derive(Debug, Clone, Default)]
pub struct LendingStore {
    tables: Arc<Mutex<Tables>>,
}

impl LendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// カタログに書籍を登録する（同じISBNは上書き）
    pub fn add_book(&self, book: Book) {
        lock(&self.tables).books.insert(book.isbn.clone(), book);
    }

    /// カタログから書籍を取り除く（貸出記録は残す）
    pub fn remove_book(&self, isbn: &Isbn) -> Option<Book> {
        lock(&self.tables).books.remove(isbn)
    }

    /// コミット済みの書籍を取得する
    pub fn book(&self, isbn: &Isbn) -> Option<Book> {
        lock(&self.tables).books.get(isbn).cloned()
    }

    /// コミット済みの全貸出をID順に取得する
    pub fn loans(&self) -> Vec<Loan> {
        lock(&self.tables).loans.values().cloned().collect()
    }
}

#[async_trait]
impl LendingStoreTrait for LendingStore {
    async fn begin(&self) -> lending_store::Result<Box<dyn LendingTransaction>> {
        Ok(Box::new(Transaction {
            tables: self.tables.clone(),
            deltas: BTreeMap::new(),
            inserted: BTreeMap::new(),
            returned: BTreeSet::new(),
        }))
    }
}

/// 未確定の変更を保持するトランザクション
struct Transaction {
    tables: Arc<Mutex<Tables>>,
    /// 書籍ごとの貸出可能数の増減
    deltas: BTreeMap<Isbn, i64>,
    /// このトランザクションで追加した貸出
    inserted: BTreeMap<LoanId, Loan>,
    /// 返却済みにしたコミット済みの貸出
    returned: BTreeSet<LoanId>,
}

/// コミット済みの書籍に増減を重ねる
fn apply_delta(book: &Book, delta: i64) -> Result<Book, MemoryStoreError> {
    let available = i64::from(book.copies.available()) + delta;
    let copies = Availability::new(i64::from(book.copies.total()), available).map_err(|_| {
        MemoryStoreError::OutOfRange {
            isbn: book.isbn.clone(),
            total: book.copies.total(),
            available,
        }
    })?;
    Ok(Book {
        copies,
        ..book.clone()
    })
}

impl Transaction {
    fn view_of(&self, book: &Book) -> Result<Book, MemoryStoreError> {
        apply_delta(book, self.deltas.get(&book.isbn).copied().unwrap_or(0))
    }

    fn is_active(&self, loan: &Loan) -> bool {
        loan.is_active() && !self.returned.contains(&loan.loan_id)
    }
}

#[async_trait]
impl CatalogStore for Transaction {
    async fn find_book(&mut self, isbn: &Isbn) -> catalog_store::Result<Option<Book>> {
        let tables = lock(&self.tables);
        match tables.books.get(isbn) {
            Some(book) => Ok(Some(self.view_of(book)?)),
            None => Ok(None),
        }
    }

    async fn lock_book(&mut self, isbn: &Isbn) -> catalog_store::Result<Option<Book>> {
        self.find_book(isbn).await
    }

    async fn find_best_by_title(
        &mut self,
        title: &BookTitle,
    ) -> catalog_store::Result<Option<Book>> {
        let tables = lock(&self.tables);
        let mut best: Option<Book> = None;
        // BTreeMapはISBN昇順なので、同数の場合は先に見つかったものが残る
        for book in tables.books.values().filter(|book| &book.title == title) {
            let book = self.view_of(book)?;
            let better = best
                .as_ref()
                .is_none_or(|current| book.copies.available() > current.copies.available());
            if better {
                best = Some(book);
            }
        }
        Ok(best)
    }

    async fn adjust_available(&mut self, isbn: &Isbn, delta: i32) -> catalog_store::Result<()> {
        let pending = self.deltas.get(isbn).copied().unwrap_or(0) + i64::from(delta);
        {
            let tables = lock(&self.tables);
            let book = tables
                .books
                .get(isbn)
                .ok_or_else(|| MemoryStoreError::BookNotFound(isbn.clone()))?;
            apply_delta(book, pending)?;
        }
        self.deltas.insert(isbn.clone(), pending);
        Ok(())
    }
}

#[async_trait]
impl LoanLedger for Transaction {
    async fn insert_loan(&mut self, new_loan: NewLoan) -> loan_ledger::Result<Loan> {
        // 採番はロールバックされない（DBのシーケンスと同じく欠番があり得る）
        let loan_id = {
            let mut tables = lock(&self.tables);
            tables.last_loan_id += 1;
            LoanId::new(tables.last_loan_id)
        };
        let loan = Loan::from_new(loan_id, new_loan);
        self.inserted.insert(loan_id, loan.clone());
        Ok(loan)
    }

    async fn find_active_loan(
        &mut self,
        isbn: &Isbn,
        borrower_id: &BorrowerId,
    ) -> loan_ledger::Result<Option<Loan>> {
        let tables = lock(&self.tables);
        let found = tables
            .loans
            .values()
            .chain(self.inserted.values())
            .filter(|loan| &loan.isbn == isbn && &loan.borrower_id == borrower_id)
            .filter(|loan| self.is_active(loan))
            .min_by_key(|loan| loan.loan_id)
            .cloned();
        Ok(found)
    }

    async fn mark_returned(&mut self, loan_id: LoanId) -> loan_ledger::Result<()> {
        if let Some(loan) = self.inserted.get_mut(&loan_id) {
            if !loan.is_active() {
                return Err(MemoryStoreError::LoanNotActive(loan_id.value()).into());
            }
            loan.status = LoanStatus::Returned;
            return Ok(());
        }

        let committed_active = {
            let tables = lock(&self.tables);
            tables.loans.get(&loan_id).is_some_and(|loan| self.is_active(loan))
        };
        if !committed_active {
            return Err(MemoryStoreError::LoanNotActive(loan_id.value()).into());
        }
        self.returned.insert(loan_id);
        Ok(())
    }
}

#[async_trait]
impl LendingTransaction for Transaction {
    /// 変更を検証してからまとめて反映する
    ///
    /// 検証に失敗した場合は何も反映しない。
    async fn commit(self: Box<Self>) -> lending_store::Result<()> {
        let Transaction {
            tables: shared,
            deltas,
            inserted,
            returned,
        } = *self;
        let mut tables = lock(&shared);

        let mut updated_books = Vec::with_capacity(deltas.len());
        for (isbn, delta) in &deltas {
            let book = tables
                .books
                .get(isbn)
                .ok_or_else(|| MemoryStoreError::BookNotFound(isbn.clone()))?;
            updated_books.push(apply_delta(book, *delta)?);
        }
        for loan_id in &returned {
            let still_active = tables.loans.get(loan_id).is_some_and(Loan::is_active);
            if !still_active {
                return Err(MemoryStoreError::LoanNotActive(loan_id.value()).into());
            }
        }

        for book in updated_books {
            tables.books.insert(book.isbn.clone(), book);
        }
        for loan_id in returned {
            if let Some(loan) = tables.loans.get_mut(&loan_id) {
                loan.status = LoanStatus::Returned;
            }
        }
        tables.loans.extend(inserted);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> lending_store::Result<()> {
        Ok(())
    }
}
