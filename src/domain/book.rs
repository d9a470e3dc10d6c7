use serde::{Deserialize, Serialize};

use super::{Availability, AvailabilityError, BookTitle, Isbn};

/// 書籍（カタログの1行）
///
/// 登録・更新はカタログ管理側の責務。
/// 貸出エンジンが変更するのは貸出可能数のみ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub isbn: Isbn,
    pub title: BookTitle,
    pub author: Option<String>,
    pub copies: Availability,
}

impl Book {
    pub fn new(isbn: Isbn, title: BookTitle, author: Option<String>, copies: Availability) -> Self {
        Self {
            isbn,
            title,
            author,
            copies,
        }
    }
}

/// 純粋関数：1冊貸し出す
///
/// 副作用なし。貸出可能数を1減らしたBookを返す。
pub fn lend_copy(book: &Book) -> Result<Book, AvailabilityError> {
    Ok(Book {
        copies: book.copies.checkout()?,
        ..book.clone()
    })
}

/// 純粋関数：1冊戻す
///
/// 副作用なし。貸出可能数を1増やしたBookを返す。
pub fn restock_copy(book: &Book) -> Result<Book, AvailabilityError> {
    Ok(Book {
        copies: book.copies.checkin()?,
        ..book.clone()
    })
}
