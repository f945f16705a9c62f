//! The books: account trees, posted transactions and ledgers, with the
//! posting API that keeps them consistent.

pub mod books;
pub mod details;
mod posting;
pub mod subject;
pub mod update;
mod validation;

pub use books::Books;
pub use details::TransactionDetails;
pub use subject::{Accounting, EconomicSubject};
pub use update::TransactionUpdate;
