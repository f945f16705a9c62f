//! Serializable batches of accounting work.
//!
//! A [`Journal`] describes custom account kinds, subjects with their
//! accounts, and transactions addressed by `(owner, path)`. Replaying it
//! against a set of [`Books`] provisions the subjects and posts every
//! transaction through the posting API, in order.
//!
//! ```json
//! {
//!   "account_kinds": [{ "name": "BANK", "base": "asset" }],
//!   "subjects": [
//!     { "owner": "person:alice",
//!       "accounts": [{ "parent": "/", "name": "wallet", "kind": "ASSET" }] },
//!     { "owner": "supplier:shop",
//!       "accounts": [{ "parent": "/", "name": "till", "kind": "BANK" }] }
//!   ],
//!   "transactions": [
//!     { "type": "external",
//!       "source": { "owner": "person:alice", "path": "/wallet" },
//!       "exit_point": { "owner": "person:alice", "path": "/expenses" },
//!       "entry_point": { "owner": "supplier:shop", "path": "/incomes" },
//!       "target": { "owner": "supplier:shop", "path": "/till" },
//!       "amount": "7.20",
//!       "description": "groceries",
//!       "issuer": "person:alice",
//!       "references": ["invoice:2024-001"],
//!       "confirm": true }
//!   ]
//! }
//! ```

use crate::core::account::AccountId;
use crate::core::account_type::AccountType;
use crate::core::entity::{EntityRef, OwnerId};
use crate::core::error::{AccountingError, Result};
use crate::core::flow::{CashFlow, Split};
use crate::core::transaction::{TransactionId, TransactionMeta};
use crate::engine::Books;
use chrono::{DateTime, Utc};
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    #[serde(default)]
    pub account_kinds: Vec<KindEntry>,
    #[serde(default)]
    pub subjects: Vec<SubjectEntry>,
    #[serde(default)]
    pub transactions: Vec<TransactionEntry>,
}

/// A custom account kind to define before anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindEntry {
    pub name: String,
    pub base: AccountType,
}

/// A subject to provision, with the accounts it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectEntry {
    pub owner: OwnerId,
    #[serde(default)]
    pub accounts: Vec<AccountEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountEntry {
    #[serde(default = "default_parent")]
    pub parent: String,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub placeholder: bool,
}

fn default_parent() -> String {
    "/".to_string()
}

/// An account named by its owner and its path in the owner's tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub owner: OwnerId,
    pub path: String,
}

impl Address {
    pub fn new(owner: OwnerId, path: impl Into<String>) -> Self {
        Self {
            owner,
            path: path.into(),
        }
    }

    fn resolve(&self, books: &Books) -> Result<AccountId> {
        Ok(books.resolve(&self.owner, &self.path)?.id())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEntry {
    pub account: Address,
    pub amount: Decimal,
}

impl FlowEntry {
    fn resolve(&self, books: &Books) -> Result<CashFlow> {
        Ok(CashFlow::new(self.account.resolve(books)?, self.amount))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "lowercase")]
pub enum SplitEntry {
    Internal {
        target: FlowEntry,
        #[serde(default)]
        description: String,
    },
    External {
        exit_point: Address,
        entry_point: Address,
        target: FlowEntry,
        #[serde(default)]
        description: String,
    },
}

impl SplitEntry {
    fn resolve(&self, books: &Books) -> Result<Split> {
        Ok(match self {
            SplitEntry::Internal {
                target,
                description,
            } => Split::internal(target.resolve(books)?).with_description(description.clone()),
            SplitEntry::External {
                exit_point,
                entry_point,
                target,
                description,
            } => Split::external(
                exit_point.resolve(books)?,
                entry_point.resolve(books)?,
                target.resolve(books)?,
            )
            .with_description(description.clone()),
        })
    }
}

/// Which posting function to call, with its account arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Posting {
    Simple {
        source: Address,
        target: Address,
        amount: Decimal,
    },
    Internal {
        source: FlowEntry,
        targets: Vec<FlowEntry>,
    },
    External {
        source: Address,
        exit_point: Address,
        entry_point: Address,
        target: Address,
        amount: Decimal,
    },
    Split {
        source: FlowEntry,
        splits: Vec<SplitEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionEntry {
    #[serde(flatten)]
    pub posting: Posting,
    pub description: String,
    pub issuer: OwnerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<EntityRef>,
    #[serde(default)]
    pub confirm: bool,
}

impl TransactionEntry {
    pub fn new(posting: Posting, description: impl Into<String>, issuer: OwnerId) -> Self {
        Self {
            posting,
            description: description.into(),
            issuer,
            date: None,
            kind: None,
            references: Vec::new(),
            confirm: false,
        }
    }

    fn meta(&self) -> TransactionMeta {
        let mut meta = TransactionMeta::new(self.description.clone(), self.issuer.clone());
        if let Some(date) = self.date {
            meta = meta.with_date(date);
        }
        if let Some(kind) = &self.kind {
            meta = meta.with_kind(kind.clone());
        }
        meta
    }

    fn post(&self, books: &mut Books) -> Result<TransactionId> {
        let meta = self.meta();
        let id = match &self.posting {
            Posting::Simple {
                source,
                target,
                amount,
            } => {
                let (source, target) = (source.resolve(books)?, target.resolve(books)?);
                books
                    .register_simple_transaction(source, target, *amount, meta)?
                    .id()
            }
            Posting::Internal { source, targets } => {
                let source = source.resolve(books)?;
                let targets = targets
                    .iter()
                    .map(|flow| flow.resolve(books))
                    .collect::<Result<Vec<_>>>()?;
                books
                    .register_internal_transaction(source, targets, meta)?
                    .id()
            }
            Posting::External {
                source,
                exit_point,
                entry_point,
                target,
                amount,
            } => {
                let source = source.resolve(books)?;
                let exit_point = exit_point.resolve(books)?;
                let entry_point = entry_point.resolve(books)?;
                let target = target.resolve(books)?;
                books
                    .register_transaction(source, exit_point, entry_point, target, *amount, meta)?
                    .id()
            }
            Posting::Split { source, splits } => {
                let source = source.resolve(books)?;
                let splits = splits
                    .iter()
                    .map(|split| split.resolve(books))
                    .collect::<Result<Vec<_>>>()?;
                books.register_split_transaction(source, splits, meta)?.id()
            }
        };
        books.add_references(id, self.references.iter().cloned())?;
        if self.confirm {
            books.confirm_transaction(id)?;
        }
        Ok(id)
    }
}

impl Journal {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Define account kinds, provision subjects, then post every transaction
    /// in order. Stops at the first failure; work done before it stays in
    /// the books.
    pub fn replay(&self, books: &mut Books) -> Result<Vec<TransactionId>> {
        for kind in &self.account_kinds {
            books.define_account_kind(&kind.name, kind.base)?;
        }
        for subject in &self.subjects {
            provision(books, subject)?;
        }
        let mut ids = Vec::with_capacity(self.transactions.len());
        for transaction in &self.transactions {
            ids.push(transaction.post(books)?);
        }
        info!(
            "replayed journal: {} subject(s), {} transaction(s)",
            self.subjects.len(),
            ids.len()
        );
        Ok(ids)
    }
}

/// Open the subject's accounting if needed and create its accounts. An
/// account already present with the same kind and placeholder flag is reused.
fn provision(books: &mut Books, subject: &SubjectEntry) -> Result<()> {
    if !books.has_tree(&subject.owner) {
        books.open_accounting(subject.owner.clone())?;
    }
    for entry in &subject.accounts {
        let kind = books.account_kind(&entry.kind)?.clone();
        let tree = books.tree_mut(&subject.owner)?;
        let parent = tree.resolve(&entry.parent)?.id();
        let existing = tree.get_child(parent, &entry.name).ok().map(|account| {
            (
                account.path().to_string(),
                account.kind().clone(),
                account.is_placeholder(),
            )
        });
        match existing {
            Some((_, existing_kind, placeholder))
                if existing_kind == kind && placeholder == entry.placeholder => {}
            Some((path, existing_kind, placeholder)) => {
                return Err(AccountingError::already_exists(format!(
                    "account '{}' of {} with kind {}{}",
                    path,
                    subject.owner,
                    existing_kind,
                    if placeholder { " (placeholder)" } else { "" }
                )));
            }
            None => {
                tree.add_child(parent, &entry.name, kind, entry.placeholder)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"{
        "account_kinds": [{ "name": "bank", "base": "asset" }],
        "subjects": [
            { "owner": "person:alice",
              "accounts": [
                { "name": "wallet", "kind": "ASSET" },
                { "name": "savings", "kind": "BANK" },
                { "name": "incomes", "kind": "INCOME" }
              ] },
            { "owner": "supplier:shop",
              "accounts": [{ "parent": "/", "name": "till", "kind": "ASSET" }] }
        ],
        "transactions": [
            { "type": "simple",
              "source": { "owner": "person:alice", "path": "/wallet" },
              "target": { "owner": "person:alice", "path": "/savings" },
              "amount": "10.5",
              "description": "save",
              "issuer": "person:alice" },
            { "type": "external",
              "source": { "owner": "person:alice", "path": "/savings" },
              "exit_point": { "owner": "person:alice", "path": "/expenses" },
              "entry_point": { "owner": "supplier:shop", "path": "/incomes" },
              "target": { "owner": "supplier:shop", "path": "/till" },
              "amount": "7.2",
              "description": "groceries",
              "issuer": "person:alice",
              "kind": "PAYMENT",
              "references": ["invoice:1"],
              "confirm": true },
            { "type": "split",
              "source": { "account": { "owner": "supplier:shop", "path": "/till" }, "amount": "3" },
              "splits": [
                { "path": "internal",
                  "target": { "account": { "owner": "supplier:shop", "path": "/till" }, "amount": "-1" } },
                { "path": "external",
                  "exit_point": { "owner": "supplier:shop", "path": "/expenses" },
                  "entry_point": { "owner": "person:alice", "path": "/incomes" },
                  "target": { "account": { "owner": "person:alice", "path": "/wallet" }, "amount": "-2" },
                  "description": "refund" }
              ],
              "description": "partial refund",
              "issuer": "supplier:shop" }
        ]
    }"#;

    #[test]
    fn test_replay_sample() {
        let journal = Journal::from_json_str(SAMPLE).unwrap();
        let mut books = Books::new();
        let ids = journal.replay(&mut books).unwrap();
        assert_eq!(ids.len(), 3);

        let alice = OwnerId::new("person", "alice");
        let shop = OwnerId::new("supplier", "shop");
        let wallet = books.resolve(&alice, "/wallet").unwrap().id();
        let savings = books.resolve(&alice, "/savings").unwrap();
        assert_eq!(savings.kind().name(), "BANK");
        let savings = savings.id();
        let till = books.resolve(&shop, "/till").unwrap().id();

        assert_eq!(books.balance(wallet), dec!(-8.5));
        assert_eq!(books.balance(savings), dec!(3.3));
        assert_eq!(books.balance(till), dec!(5.2));
        assert_eq!(books.total_amount(&alice).unwrap(), dec!(-5.2));
        assert_eq!(books.total_amount(&shop).unwrap(), dec!(5.2));

        let payment = books.transaction(ids[1]).unwrap();
        assert!(payment.is_confirmed());
        assert_eq!(payment.kind(), Some("PAYMENT"));
        assert_eq!(
            books
                .transactions_by_reference(&[EntityRef::new("invoice", "1")])
                .len(),
            1
        );
    }

    #[test]
    fn test_conflicting_existing_account() {
        let json = r#"{
            "subjects": [
                { "owner": "person:bob", "accounts": [{ "name": "incomes", "kind": "EXPENSE" }] }
            ]
        }"#;
        let journal = Journal::from_json_str(json).unwrap();
        let mut books = Books::new();
        assert!(matches!(
            journal.replay(&mut books),
            Err(AccountingError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_existing_account_placeholder_must_match() {
        let reused = r#"{
            "subjects": [
                { "owner": "person:bob", "accounts": [{ "name": "incomes", "kind": "INCOME" }] }
            ]
        }"#;
        let mut books = Books::new();
        Journal::from_json_str(reused).unwrap().replay(&mut books).unwrap();
        let incomes = books.resolve(&OwnerId::new("person", "bob"), "/incomes").unwrap();
        assert!(!incomes.is_placeholder());

        let conflicting = r#"{
            "subjects": [
                { "owner": "person:bob", "accounts": [
                    { "name": "incomes", "kind": "INCOME", "placeholder": true } ] }
            ]
        }"#;
        let mut books = Books::new();
        let err = Journal::from_json_str(conflicting)
            .unwrap()
            .replay(&mut books)
            .unwrap_err();
        assert!(matches!(err, AccountingError::AlreadyExists { .. }));
    }

    #[test]
    fn test_replay_stops_at_first_error() {
        let json = r#"{
            "subjects": [
                { "owner": "person:bob", "accounts": [
                    { "name": "a", "kind": "ASSET" }, { "name": "b", "kind": "ASSET" } ] }
            ],
            "transactions": [
                { "type": "simple",
                  "source": { "owner": "person:bob", "path": "/a" },
                  "target": { "owner": "person:bob", "path": "/missing" },
                  "amount": "1", "description": "x", "issuer": "person:bob" },
                { "type": "simple",
                  "source": { "owner": "person:bob", "path": "/a" },
                  "target": { "owner": "person:bob", "path": "/b" },
                  "amount": "1", "description": "y", "issuer": "person:bob" }
            ]
        }"#;
        let journal = Journal::from_json_str(json).unwrap();
        let mut books = Books::new();
        assert!(matches!(
            journal.replay(&mut books),
            Err(AccountingError::NotFound { .. })
        ));
        assert!(books.transactions().is_empty());
    }

    #[test]
    fn test_journal_json_round_trip() {
        let journal = Journal::from_json_str(SAMPLE).unwrap();
        let json = journal.to_json_pretty().unwrap();
        assert_eq!(Journal::from_json_str(&json).unwrap(), journal);
    }
}
