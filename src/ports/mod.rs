pub mod catalog_store;
pub mod lending_store;
pub mod loan_ledger;

pub use catalog_store::CatalogStore;
pub use lending_store::{LendingStore, LendingTransaction};
pub use loan_ledger::LoanLedger;
