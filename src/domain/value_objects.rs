use serde::{Deserialize, Serialize};
use std::fmt;

use super::{AvailabilityError, ValueError};

/// 空文字・空白のみの文字列を拒否する
///
/// 値は加工しない。ストアに保存された文字列とそのまま一致させる。
fn non_blank(value: impl Into<String>, field: &'static str) -> Result<String, ValueError> {
    let value = value.into();
    if value.trim().is_empty() {
        return Err(ValueError::Blank(field));
    }
    Ok(value)
}

/// ISBN - 書籍（版）を一意に識別するキー
///
/// 形式（ISBN-10/13のチェックディジット）は検証しない。
/// カタログに登録されている文字列をそのままキーとして扱う。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn(String);

impl Isbn {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueError> {
        non_blank(value, "isbn").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Isbn {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Isbn> for String {
    fn from(isbn: Isbn) -> Self {
        isbn.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 利用者ID - 貸出を受ける人の識別子
///
/// 認証は行わない。呼び出し側から渡された値をそのまま記録する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BorrowerId(String);

impl BorrowerId {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueError> {
        non_blank(value, "borrower_id").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BorrowerId {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BorrowerId> for String {
    fn from(id: BorrowerId) -> Self {
        id.0
    }
}

impl fmt::Display for BorrowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 書籍タイトル（空文字不可）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookTitle(String);

impl BookTitle {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueError> {
        non_blank(value, "title").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BookTitle {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BookTitle> for String {
    fn from(title: BookTitle) -> Self {
        title.0
    }
}

impl fmt::Display for BookTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 貸出ID - ストアが採番する連番
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoanId(i64);

impl LoanId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// 蔵書数と貸出可能数
///
/// 不変条件：0 <= available <= total
/// 型システムでこの制約を強制し、範囲外の値を作成できないようにする。
/// totalは貸出・返却では変化しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    total: u32,
    available: u32,
}

impl Availability {
    /// 全冊貸出可能な状態で作成
    pub fn fully_stocked(total: u32) -> Self {
        Self {
            total,
            available: total,
        }
    }

    /// 永続化された値から復元する
    ///
    /// # エラー
    /// 負数、またはavailableがtotalを超える場合は`AvailabilityError::OutOfRange`
    pub fn new(total: i64, available: i64) -> Result<Self, AvailabilityError> {
        let out_of_range = || AvailabilityError::OutOfRange { total, available };
        let total = u32::try_from(total).map_err(|_| out_of_range())?;
        let available = u32::try_from(available).map_err(|_| out_of_range())?;
        if available > total {
            return Err(out_of_range());
        }
        Ok(Self { total, available })
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn available(&self) -> u32 {
        self.available
    }

    pub fn can_lend(&self) -> bool {
        self.available > 0
    }

    /// 1冊貸し出した後の状態
    ///
    /// # エラー
    /// 貸出可能数が0の場合は`AvailabilityError::NoCopiesAvailable`
    pub fn checkout(self) -> Result<Self, AvailabilityError> {
        if !self.can_lend() {
            return Err(AvailabilityError::NoCopiesAvailable);
        }
        Ok(Self {
            available: self.available - 1,
            ..self
        })
    }

    /// 1冊返却された後の状態
    ///
    /// # エラー
    /// 既に全冊が揃っている場合は`AvailabilityError::ExceedsTotal`。
    /// 正しい貸出記録がある限り発生しないため、データ破損として扱う。
    pub fn checkin(self) -> Result<Self, AvailabilityError> {
        if self.available >= self.total {
            return Err(AvailabilityError::ExceedsTotal { total: self.total });
        }
        Ok(Self {
            available: self.available + 1,
            ..self
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_kept_verbatim() {
        let isbn = Isbn::new(" 978-0-13-110362-7").unwrap();
        assert_eq!(isbn.as_str(), " 978-0-13-110362-7");

        let title = BookTitle::new(" Dune ").unwrap();
        assert_eq!(title.as_str(), " Dune ");
    }

    #[test]
    fn test_isbn_rejects_blank() {
        assert_eq!(Isbn::new("   "), Err(ValueError::Blank("isbn")));
        assert_eq!(Isbn::new(""), Err(ValueError::Blank("isbn")));
    }

    #[test]
    fn test_borrower_id_rejects_blank() {
        assert_eq!(BorrowerId::new(""), Err(ValueError::Blank("borrower_id")));
        assert!(BorrowerId::new("alice").is_ok());
    }

    #[test]
    fn test_book_title_rejects_blank() {
        assert_eq!(BookTitle::new("\t"), Err(ValueError::Blank("title")));
    }

    #[test]
    fn test_isbn_deserialize_validates() {
        let ok: Isbn = serde_json::from_str("\"111\"").unwrap();
        assert_eq!(ok.as_str(), "111");

        let blank: Result<Isbn, _> = serde_json::from_str("\"  \"");
        assert!(blank.is_err());
    }

    // TDD: Availability のテスト
    #[test]
    fn test_availability_fully_stocked() {
        let copies = Availability::fully_stocked(3);
        assert_eq!(copies.total(), 3);
        assert_eq!(copies.available(), 3);
        assert!(copies.can_lend());
    }

    #[test]
    fn test_availability_checkout_decrements() {
        let copies = Availability::fully_stocked(2).checkout().unwrap();
        assert_eq!(copies.available(), 1);
        assert_eq!(copies.total(), 2);
    }

    #[test]
    fn test_availability_checkout_fails_at_zero() {
        let copies = Availability::new(2, 0).unwrap();
        assert!(!copies.can_lend());
        assert_eq!(
            copies.checkout().unwrap_err(),
            AvailabilityError::NoCopiesAvailable
        );
    }

    #[test]
    fn test_availability_checkin_increments() {
        let copies = Availability::new(2, 0).unwrap().checkin().unwrap();
        assert_eq!(copies.available(), 1);
    }

    #[test]
    fn test_availability_checkin_never_exceeds_total() {
        let copies = Availability::fully_stocked(2);
        assert_eq!(
            copies.checkin().unwrap_err(),
            AvailabilityError::ExceedsTotal { total: 2 }
        );
    }

    #[test]
    fn test_availability_zero_total_cannot_lend_or_return() {
        let copies = Availability::fully_stocked(0);
        assert!(copies.checkout().is_err());
        assert!(copies.checkin().is_err());
    }

    #[test]
    fn test_availability_new_rejects_out_of_range() {
        assert!(Availability::new(2, 3).is_err());
        assert!(Availability::new(2, -1).is_err());
        assert!(Availability::new(-1, 0).is_err());
        assert!(Availability::new(2, 2).is_ok());
        assert!(Availability::new(0, 0).is_ok());
    }
}
