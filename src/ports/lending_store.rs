use async_trait::async_trait;

use super::{CatalogStore, LoanLedger};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// カタログと台帳をまたぐトランザクション
///
/// `commit`されずに破棄された場合、変更はすべて捨てられる。
#[async_trait]
pub trait LendingTransaction: CatalogStore + LoanLedger {
    /// 変更を確定する
    async fn commit(self: Box<Self>) -> Result<()>;

    /// 変更を破棄する
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// 貸出ストアポート
///
/// トランザクションの開始のみを提供する。
/// どの範囲をひとつのトランザクションにするかは貸出エンジンが決める。
#[async_trait]
pub trait LendingStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn LendingTransaction>>;
}
