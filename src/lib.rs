//! # accounting-engine
//!
//! Double-entry bookkeeping for a community of economic subjects.
//!
//! Every subject (a person, a supplier, a purchasing group...) owns a tree of
//! accounts. Money moves between accounts through transactions: a source
//! flow fanned out to one or more splits, each possibly crossing from the
//! source tree into another one through a pair of flux accounts. Every
//! posted transaction conserves money exactly and is fully reflected in
//! per-account ledgers.
//!
//! ## Architecture
//!
//! - **core**: Foundational types: identities, account types, accounts and trees, flows, transactions, ledgers, errors
//! - **engine**: The `Books` store and its posting API
//! - **config**: Engine configuration
//! - **journal**: Serializable batches of subjects and transactions, replayable against `Books`
//! - **simulation**: Random workload generation
//!
//! ## Example
//!
//! ```
//! use accounting_engine::prelude::*;
//! use rust_decimal_macros::dec;
//!
//! let mut books = Books::new();
//! let alice = OwnerId::new("person", "alice");
//! let shop = OwnerId::new("supplier", "shop");
//! books.open_accounting(alice.clone()).unwrap();
//! books.open_accounting(shop.clone()).unwrap();
//!
//! let wallet = books.tree_mut(&alice).unwrap()
//!     .add_account("/", "wallet", AccountType::Asset, false).unwrap().id();
//! let till = books.tree_mut(&shop).unwrap()
//!     .add_account("/", "till", AccountType::Asset, false).unwrap().id();
//! let expenses = books.resolve(&alice, "/expenses").unwrap().id();
//! let incomes = books.resolve(&shop, "/incomes").unwrap().id();
//!
//! books.register_transaction(
//!     wallet, expenses, incomes, till, dec!(7.2),
//!     TransactionMeta::new("groceries", alice.clone()),
//! ).unwrap();
//!
//! assert_eq!(books.balance(wallet), dec!(-7.2));
//! assert_eq!(books.balance(till), dec!(7.2));
//! assert_eq!(books.total_amount(&shop).unwrap(), dec!(7.2));
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod journal;
pub mod simulation;

pub use crate::core::error::{AccountingError, Result};

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::account::{Account, AccountId};
    pub use crate::core::account_type::{AccountKind, AccountType};
    pub use crate::core::entity::{EntityRef, OwnerId};
    pub use crate::core::error::{AccountingError, Result};
    pub use crate::core::flow::{CashFlow, Split};
    pub use crate::core::ledger::{Ledger, LedgerEntry};
    pub use crate::core::transaction::{Transaction, TransactionId, TransactionMeta};
    pub use crate::core::tree::AccountTree;
    pub use crate::engine::{Accounting, Books, EconomicSubject, TransactionUpdate};
    pub use crate::journal::Journal;
}
