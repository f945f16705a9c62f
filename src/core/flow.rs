use crate::core::account::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A signed amount of money moving from/to a stock-like account.
///
/// Sign convention: a positive amount leaves the account (outgoing),
/// a negative amount enters it (incoming).
///
/// # Examples
///
/// ```
/// use accounting_engine::core::flow::CashFlow;
/// # use accounting_engine::prelude::*;
/// use rust_decimal_macros::dec;
///
/// # let mut books = Books::new();
/// # let owner = OwnerId::new("person", "alice");
/// # books.open_accounting(owner.clone()).unwrap();
/// # let wallet = books.tree_mut(&owner).unwrap().add_account("/", "wallet", AccountType::Asset, false).unwrap().id();
/// let flow = CashFlow::new(wallet, dec!(12.50));
/// assert!(flow.is_outgoing());
/// assert!(!flow.is_incoming());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlow {
    account: AccountId,
    amount: Decimal,
}

impl CashFlow {
    pub fn new(account: AccountId, amount: Decimal) -> Self {
        Self { account, amount }
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn is_incoming(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn is_outgoing(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

/// The path a split takes before reaching its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "lowercase")]
pub enum SplitPath {
    /// The split stays inside the source account's tree.
    Internal,
    /// The split leaves the source tree through `exit_point` and enters the
    /// target tree through `entry_point`. Both must be flux-like.
    External {
        exit_point: AccountId,
        entry_point: AccountId,
    },
}

/// One leg of a transaction: the route money takes from the transaction's
/// shared source to one target flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    path: SplitPath,
    target: CashFlow,
    #[serde(default)]
    description: String,
}

impl Split {
    /// A split confined to the source account's tree.
    pub fn internal(target: CashFlow) -> Self {
        Self {
            path: SplitPath::Internal,
            target,
            description: String::new(),
        }
    }

    /// A split crossing from the source tree to the target tree.
    pub fn external(exit_point: AccountId, entry_point: AccountId, target: CashFlow) -> Self {
        Self {
            path: SplitPath::External {
                exit_point,
                entry_point,
            },
            target,
            description: String::new(),
        }
    }

    /// Set a memo for this split.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn path(&self) -> &SplitPath {
        &self.path
    }

    pub fn target(&self) -> &CashFlow {
        &self.target
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.path, SplitPath::Internal)
    }

    pub fn exit_point(&self) -> Option<AccountId> {
        match self.path {
            SplitPath::External { exit_point, .. } => Some(exit_point),
            SplitPath::Internal => None,
        }
    }

    pub fn entry_point(&self) -> Option<AccountId> {
        match self.path {
            SplitPath::External { entry_point, .. } => Some(entry_point),
            SplitPath::Internal => None,
        }
    }

    /// Money flowing through the split (the opposite of the target flow).
    pub fn amount(&self) -> Decimal {
        -self.target.amount()
    }

    /// `[exit point, entry point, target account]`, with `None` waypoints for
    /// internal splits.
    pub fn accounts(&self) -> [Option<AccountId>; 3] {
        [
            self.exit_point(),
            self.entry_point(),
            Some(self.target.account()),
        ]
    }

    pub fn involves(&self, account: AccountId) -> bool {
        self.accounts().contains(&Some(account))
    }
}
