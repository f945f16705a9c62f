//! Foundational types: identities, account types, accounts and trees,
//! cash flows and splits, transactions, ledgers and errors.

pub mod account;
pub mod account_type;
pub mod entity;
pub mod error;
pub mod flow;
pub mod ledger;
pub mod transaction;
pub mod tree;
