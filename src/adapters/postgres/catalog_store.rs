use crate::domain::{Availability, Book, BookTitle, Isbn};
use crate::ports::catalog_store::{CatalogStore, Result};
use async_trait::async_trait;
use sqlx::{Row, postgres::PgRow};

use super::lending_store::Transaction;

/// PostgreSQLの行データをBookに変換する
///
/// 蔵書数の不変条件を満たさない行はデータ破損としてエラーにする。
fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let isbn: String = row.try_get("isbn")?;
    let title: String = row.try_get("title")?;
    let total: i32 = row.try_get("total_copies")?;
    let available: i32 = row.try_get("available_copies")?;

    let invalid = |e: String| {
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            as Box<dyn std::error::Error + Send + Sync>
    };

    Ok(Book {
        isbn: Isbn::new(isbn).map_err(|e| invalid(e.to_string()))?,
        title: BookTitle::new(title).map_err(|e| invalid(e.to_string()))?,
        author: row.try_get("author")?,
        copies: Availability::new(total.into(), available.into())
            .map_err(|e| invalid(e.to_string()))?,
    })
}

#[async_trait]
impl CatalogStore for Transaction {
    async fn find_book(&mut self, isbn: &Isbn) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT isbn, title, author, total_copies, available_copies
            FROM books
            WHERE isbn = $1
            "#,
        )
        .bind(isbn.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    /// 書籍行をトランザクション終了までロックする
    async fn lock_book(&mut self, isbn: &Isbn) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT isbn, title, author, total_copies, available_copies
            FROM books
            WHERE isbn = $1
            FOR UPDATE
            "#,
        )
        .bind(isbn.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    /// (title, available_copies DESC)のインデックスを使用
    async fn find_best_by_title(&mut self, title: &BookTitle) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT isbn, title, author, total_copies, available_copies
            FROM books
            WHERE title = $1
            ORDER BY available_copies DESC, isbn ASC
            LIMIT 1
            "#,
        )
        .bind(title.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    /// 範囲外になる更新はCHECK制約違反としてエラーになる
    async fn adjust_available(&mut self, isbn: &Isbn, delta: i32) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET available_copies = available_copies + $2
            WHERE isbn = $1
            "#,
        )
        .bind(isbn.as_str())
        .bind(delta)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(format!("book {} not found", isbn).into());
        }
        Ok(())
    }
}
