pub mod catalog_store;
pub mod lending_store;
pub mod loan_ledger;

// パブリックに型を再エクスポート
pub use lending_store::LendingStore as PostgresLendingStore;
