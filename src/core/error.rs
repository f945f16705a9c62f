//! Error types for the accounting engine.
//!
//! Every fallible operation returns [`AccountingError`]. The variants follow
//! how callers are expected to react:
//!
//! - **MalformedPath**: a caller bug, never retried.
//! - **NotFound** / **AlreadyExists**: recoverable (create the missing
//!   account, or fetch the existing one).
//! - **MalformedTree**: structural corruption, fatal.
//! - **MalformedAccount** / **MalformedTransaction**: an invariant of the
//!   accounting model would be broken; nothing was written.
//! - **InvalidAccountingOperation**: a well-formed request that is illegal
//!   given already-committed state.

use crate::core::account::AccountId;
use crate::core::entity::OwnerId;
use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AccountingError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AccountingError {
    #[error("malformed account path '{path}': {reason}")]
    MalformedPath { path: String, reason: &'static str },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("already exists: {what}")]
    AlreadyExists { what: String },

    #[error("malformed account tree for {owner}: {reason}")]
    MalformedTree { owner: OwnerId, reason: &'static str },

    #[error("invalid account '{path}': {rule}")]
    MalformedAccount { path: String, rule: AccountRule },

    #[error("malformed transaction: {0}")]
    MalformedTransaction(TransactionRule),

    #[error("invalid accounting operation: {0}")]
    InvalidAccountingOperation(String),
}

impl AccountingError {
    pub(crate) fn malformed_path(path: &str, reason: &'static str) -> Self {
        AccountingError::MalformedPath {
            path: path.to_string(),
            reason,
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        AccountingError::NotFound { what: what.into() }
    }

    pub(crate) fn already_exists(what: impl Into<String>) -> Self {
        AccountingError::AlreadyExists { what: what.into() }
    }

    /// The violated transaction rule, if this is a `MalformedTransaction`.
    pub fn transaction_rule(&self) -> Option<&TransactionRule> {
        match self {
            AccountingError::MalformedTransaction(rule) => Some(rule),
            _ => None,
        }
    }
}

/// Invariants checked whenever an account is inserted in a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountRule {
    #[error("parent account belongs to a different account tree")]
    ForeignParent,
    #[error("a stock-like account's parent must be stock-like or the root")]
    StockUnderFlux,
    #[error("a flux-like account's parent must be flux-like or the root")]
    FluxUnderStock,
    #[error("only the root account may have the ROOT type")]
    MisplacedRootType,
    #[error("only the root account may have an empty name")]
    EmptyName,
    #[error("account names cannot contain the path separator '{0}'")]
    SeparatorInName(char),
    #[error("account names cannot start or end with whitespace")]
    SurroundingWhitespace,
}

/// Invariants checked before a transaction is posted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionRule {
    #[error("account {0} does not exist")]
    UnknownAccount(AccountId),
    #[error("cash flows must involve stock-like accounts, {0} is not")]
    FlowNotStock(AccountId),
    #[error("exit points must be flux-like accounts, {0} is not")]
    ExitPointNotFlux(AccountId),
    #[error("entry points must be flux-like accounts, {0} is not")]
    EntryPointNotFlux(AccountId),
    #[error("split targets must be stock-like accounts, {0} is not")]
    TargetNotStock(AccountId),
    #[error("entry point {entry_point} and target {target} belong to different account trees")]
    EntryPointTargetMismatch {
        entry_point: AccountId,
        target: AccountId,
    },
    #[error("exit point {0} does not belong to the source account's tree")]
    ForeignExitPoint(AccountId),
    #[error("internal split target {0} does not belong to the source account's tree")]
    ForeignInternalTarget(AccountId),
    #[error("placeholder account {0} cannot be involved directly in a transaction")]
    PlaceholderAccount(AccountId),
    #[error("the law of conservation of money is not satisfied (flows sum to {0})")]
    ConservationOfMoney(Decimal),
    #[error("a transaction needs at least one split")]
    NoSplits,
    #[error("transaction kind '{0}' is not allowed")]
    KindNotAllowed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_messages() {
        let err = AccountingError::malformed_path("//a", "empty path component");
        assert_eq!(
            err.to_string(),
            "malformed account path '//a': empty path component"
        );

        let err = AccountingError::MalformedTransaction(TransactionRule::ConservationOfMoney(
            dec!(0.5),
        ));
        assert!(err.to_string().contains("conservation of money"));
        assert_eq!(
            err.transaction_rule(),
            Some(&TransactionRule::ConservationOfMoney(dec!(0.5)))
        );
    }
}
