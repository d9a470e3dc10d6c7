use crate::domain::{Book, BookTitle, Isbn};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// カタログストアポート
///
/// 書籍テーブルへのアクセスを抽象化する。
/// メソッドはすべて開始済みトランザクションの中で実行される
/// （トランザクション境界は`LendingStore`が提供する）。
#[async_trait]
pub trait CatalogStore: Send {
    /// ISBNで書籍を取得する（ロックなし）
    async fn find_book(&mut self, isbn: &Isbn) -> Result<Option<Book>>;

    /// ISBNで書籍を取得し、トランザクション終了まで行をロックする
    ///
    /// 行ロックを持たないストアは`find_book`と同じ動作でよい。
    /// その場合の直列化は貸出エンジンのISBNロックが担う。
    async fn lock_book(&mut self, isbn: &Isbn) -> Result<Option<Book>>;

    /// タイトルが一致する書籍のうち、貸出可能数が最大のものを取得する
    ///
    /// 貸出可能数が同じ場合はISBNの昇順で最初のもの。
    async fn find_best_by_title(&mut self, title: &BookTitle) -> Result<Option<Book>>;

    /// 貸出可能数を`delta`だけ増減する（±1）
    ///
    /// 0未満または蔵書数超過になる書き込みはエラーとする。
    async fn adjust_available(&mut self, isbn: &Isbn, delta: i32) -> Result<()>;
}
