//! Re-posting of existing transactions with changed parameters.
//!
//! A posted transaction is never edited in place. Updating one re-derives the
//! arguments of the posting function that could have produced it, merges the
//! requested changes, and posts the result in place of the original.

use crate::core::account::AccountId;
use crate::core::entity::OwnerId;
use crate::core::error::{AccountingError, Result};
use crate::core::flow::{CashFlow, Split};
use crate::core::transaction::{Transaction, TransactionId, TransactionMeta};
use crate::engine::books::Books;
use chrono::{DateTime, Utc};
use log::{info, warn};
use rust_decimal::Decimal;

/// Changes to apply to a posted transaction.
///
/// Metadata changes apply to any transaction. Structural changes must fit the
/// shape of the transaction being updated:
///
/// | shape | accepted fields |
/// |---|---|
/// | simple | `amount`, `source_account`, `target_account` |
/// | internal | `source`, `targets` |
/// | external (single split) | `amount`, `source_account`, `exit_point`, `entry_point`, `target_account` |
/// | split | `source`, `splits` |
///
/// # Examples
///
/// ```
/// use accounting_engine::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let mut books = Books::new();
/// let alice = OwnerId::new("person", "alice");
/// books.open_accounting(alice.clone()).unwrap();
/// let tree = books.tree_mut(&alice).unwrap();
/// let wallet = tree.add_account("/", "wallet", AccountType::Asset, false).unwrap().id();
/// let bank = tree.add_account("/", "bank", AccountType::Asset, false).unwrap().id();
///
/// let id = books
///     .register_simple_transaction(wallet, bank, dec!(10), TransactionMeta::new("deposit", alice))
///     .unwrap()
///     .id();
/// let updated = books
///     .update_transaction(id, TransactionUpdate::new().amount(dec!(12)).description("fixed deposit"))
///     .unwrap();
/// assert_eq!(updated.description(), "fixed deposit");
/// assert_eq!(books.balance(bank), dec!(12));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    description: Option<String>,
    issuer: Option<OwnerId>,
    date: Option<DateTime<Utc>>,
    kind: Option<Option<String>>,
    amount: Option<Decimal>,
    source_account: Option<AccountId>,
    target_account: Option<AccountId>,
    exit_point: Option<AccountId>,
    entry_point: Option<AccountId>,
    source: Option<CashFlow>,
    targets: Option<Vec<CashFlow>>,
    splits: Option<Vec<Split>>,
}

impl TransactionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn issuer(mut self, issuer: OwnerId) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(Some(kind.into()));
        self
    }

    pub fn clear_kind(mut self) -> Self {
        self.kind = Some(None);
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn source_account(mut self, account: AccountId) -> Self {
        self.source_account = Some(account);
        self
    }

    pub fn target_account(mut self, account: AccountId) -> Self {
        self.target_account = Some(account);
        self
    }

    pub fn exit_point(mut self, account: AccountId) -> Self {
        self.exit_point = Some(account);
        self
    }

    pub fn entry_point(mut self, account: AccountId) -> Self {
        self.entry_point = Some(account);
        self
    }

    pub fn source(mut self, source: CashFlow) -> Self {
        self.source = Some(source);
        self
    }

    pub fn targets(mut self, targets: Vec<CashFlow>) -> Self {
        self.targets = Some(targets);
        self
    }

    pub fn splits(mut self, splits: Vec<Split>) -> Self {
        self.splits = Some(splits);
        self
    }

    fn structural_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.amount.is_some() {
            fields.push("amount");
        }
        if self.source_account.is_some() {
            fields.push("source_account");
        }
        if self.target_account.is_some() {
            fields.push("target_account");
        }
        if self.exit_point.is_some() {
            fields.push("exit_point");
        }
        if self.entry_point.is_some() {
            fields.push("entry_point");
        }
        if self.source.is_some() {
            fields.push("source");
        }
        if self.targets.is_some() {
            fields.push("targets");
        }
        if self.splits.is_some() {
            fields.push("splits");
        }
        fields
    }

    fn apply_meta(&mut self, meta: &mut TransactionMeta) {
        if let Some(description) = self.description.take() {
            meta.set_description(description);
        }
        if let Some(issuer) = self.issuer.take() {
            meta.set_issuer(issuer);
        }
        if let Some(date) = self.date.take() {
            meta.set_date(date);
        }
        if let Some(kind) = self.kind.take() {
            meta.set_kind(kind);
        }
    }
}

/// The posting function a transaction could have been produced by, with its
/// arguments.
#[derive(Debug, Clone)]
enum Shape {
    Simple {
        source_account: AccountId,
        target_account: AccountId,
        amount: Decimal,
        description: String,
    },
    Internal {
        source: CashFlow,
        splits: Vec<Split>,
    },
    External {
        source_account: AccountId,
        exit_point: AccountId,
        entry_point: AccountId,
        target_account: AccountId,
        amount: Decimal,
        description: String,
    },
    Split {
        source: CashFlow,
        splits: Vec<Split>,
    },
}

impl Shape {
    fn of(transaction: &Transaction) -> Self {
        let source = *transaction.source();
        if let [split] = transaction.splits() {
            return match (split.exit_point(), split.entry_point()) {
                (Some(exit_point), Some(entry_point)) => Shape::External {
                    source_account: source.account(),
                    exit_point,
                    entry_point,
                    target_account: split.target().account(),
                    amount: source.amount(),
                    description: split.description().to_string(),
                },
                _ => Shape::Simple {
                    source_account: source.account(),
                    target_account: split.target().account(),
                    amount: source.amount(),
                    description: split.description().to_string(),
                },
            };
        }
        let splits = transaction.splits().to_vec();
        if transaction.is_internal() {
            Shape::Internal { source, splits }
        } else {
            Shape::Split { source, splits }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Shape::Simple { .. } => "simple",
            Shape::Internal { .. } => "internal",
            Shape::External { .. } => "external",
            Shape::Split { .. } => "split",
        }
    }

    fn accepts(&self) -> &'static [&'static str] {
        match self {
            Shape::Simple { .. } => &["amount", "source_account", "target_account"],
            Shape::Internal { .. } => &["source", "targets"],
            Shape::External { .. } => &[
                "amount",
                "source_account",
                "exit_point",
                "entry_point",
                "target_account",
            ],
            Shape::Split { .. } => &["source", "splits"],
        }
    }

    fn apply(&mut self, update: &mut TransactionUpdate) -> Result<()> {
        let accepted = self.accepts();
        if let Some(field) = update
            .structural_fields()
            .into_iter()
            .find(|field| !accepted.contains(field))
        {
            return Err(AccountingError::InvalidAccountingOperation(format!(
                "'{}' cannot be changed on a {} transaction",
                field,
                self.name()
            )));
        }

        match self {
            Shape::Simple {
                source_account,
                target_account,
                amount,
                ..
            } => {
                replace(source_account, update.source_account.take());
                replace(target_account, update.target_account.take());
                replace(amount, update.amount.take());
            }
            Shape::External {
                source_account,
                exit_point,
                entry_point,
                target_account,
                amount,
                ..
            } => {
                replace(source_account, update.source_account.take());
                replace(exit_point, update.exit_point.take());
                replace(entry_point, update.entry_point.take());
                replace(target_account, update.target_account.take());
                replace(amount, update.amount.take());
            }
            Shape::Internal { source, splits } => {
                replace(source, update.source.take());
                if let Some(targets) = update.targets.take() {
                    *splits = targets.into_iter().map(Split::internal).collect();
                }
            }
            Shape::Split { source, splits } => {
                replace(source, update.source.take());
                replace(splits, update.splits.take());
            }
        }
        Ok(())
    }

    fn build(self, meta: TransactionMeta) -> Transaction {
        match self {
            Shape::Simple {
                source_account,
                target_account,
                amount,
                description,
            } => Transaction::new(
                CashFlow::new(source_account, amount),
                vec![Split::internal(CashFlow::new(target_account, -amount))
                    .with_description(description)],
                meta,
            ),
            Shape::External {
                source_account,
                exit_point,
                entry_point,
                target_account,
                amount,
                description,
            } => Transaction::new(
                CashFlow::new(source_account, amount),
                vec![Split::external(
                    exit_point,
                    entry_point,
                    CashFlow::new(target_account, -amount),
                )
                .with_description(description)],
                meta,
            ),
            Shape::Internal { source, splits } | Shape::Split { source, splits } => {
                Transaction::new(source, splits, meta)
            }
        }
    }
}

fn replace<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl Books {
    /// Replace a posted transaction by one built from its own parameters
    /// merged with `update`.
    ///
    /// The replacement is validated before anything is removed: if it is
    /// rejected, the original transaction and its ledger entries are left
    /// untouched. On success the original and all its entries are deleted,
    /// the replacement (with a new id) is posted, and the original's
    /// references are carried over. The replacement starts unconfirmed.
    pub fn update_transaction(
        &mut self,
        id: TransactionId,
        mut update: TransactionUpdate,
    ) -> Result<&Transaction> {
        let original = self.transaction(id)?;
        let mut meta = original.meta();
        update.apply_meta(&mut meta);
        let mut shape = Shape::of(original);
        shape.apply(&mut update)?;

        let mut replacement = shape.build(meta);
        if let Err(err) = self.validate(&replacement) {
            warn!(
                "rejected update of transaction {}: {}\n{}",
                id,
                err,
                self.transaction_details(&replacement)
            );
            return Err(err);
        }

        if let Some(mut original) = self.transactions.remove(&id) {
            for reference in original.take_references() {
                replacement.add_reference(reference);
            }
        }
        let removed = self.ledger.remove_transaction(id);
        info!(
            "updated transaction {} -> {} ({} ledger entries replaced)",
            id,
            replacement.id(),
            removed.len()
        );
        Ok(self.commit(replacement))
    }
}
