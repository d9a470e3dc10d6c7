use crate::ports::lending_store::{LendingStore as LendingStoreTrait, LendingTransaction, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres};

/// LendingStoreのPostgreSQL実装
///
/// 1回の操作 = 1つのDBトランザクション（既定のread committed）。
/// 書籍行は`lock_book`で`SELECT ... FOR UPDATE`され、
/// 複数のサービスインスタンスが同じDBを共有しても二重貸出は起きない。
pub struct LendingStore {
    pool: PgPool,
}

impl LendingStore {
    /// PostgreSQLコネクションプールから新しいLendingStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LendingStoreTrait for LendingStore {
    async fn begin(&self) -> Result<Box<dyn LendingTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(Transaction { tx }))
    }
}

/// sqlxトランザクションのラッパー
///
/// commitされずに破棄されるとsqlxがrollbackする。
pub struct Transaction {
    pub(super) tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl LendingTransaction for Transaction {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
