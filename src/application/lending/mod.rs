mod errors;
mod isbn_locks;
mod lending_service;
mod responses;

pub use errors::{ErrorKind, LendingError, Result};
pub use isbn_locks::{IsbnGuard, IsbnLocks};
pub use lending_service::{
    ServiceDependencies, loan_by_isbn, loan_by_title, query_by_isbn, return_book,
};
pub use responses::{LoanResponse, QueryResponse, ReturnResponse};
