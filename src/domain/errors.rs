/// 値オブジェクト生成時のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// 空文字または空白のみ
    #[error("{0} must not be blank")]
    Blank(&'static str),
}

/// 蔵書数・貸出可能数のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvailabilityError {
    /// 貸出可能な冊数が残っていない
    #[error("no copies available")]
    NoCopiesAvailable,

    /// 返却によって貸出可能数が蔵書数を超える
    #[error("available copies would exceed total copies ({total})")]
    ExceedsTotal { total: u32 },

    /// 永続化された値が不変条件を満たさない
    #[error("copy counts out of range (total={total}, available={available})")]
    OutOfRange { total: i64, available: i64 },
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReturnBookError {
    /// 既に返却済み
    #[error("loan already returned")]
    AlreadyReturned,
}
