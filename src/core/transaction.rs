use crate::core::account::AccountId;
use crate::core::entity::{EntityRef, OwnerId};
use crate::core::error::{AccountingError, Result};
use crate::core::flow::{CashFlow, Split};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Unique identifier of a posted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Descriptive data shared by every posting function.
///
/// # Examples
///
/// ```
/// use accounting_engine::core::entity::OwnerId;
/// use accounting_engine::core::transaction::TransactionMeta;
///
/// let meta = TransactionMeta::new("monthly rent", OwnerId::new("person", "alice"))
///     .with_kind("PAYMENT");
/// assert_eq!(meta.kind(), Some("PAYMENT"));
/// assert!(meta.date().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMeta {
    description: String,
    issuer: OwnerId,
    date: Option<DateTime<Utc>>,
    kind: Option<String>,
}

impl TransactionMeta {
    pub fn new(description: impl Into<String>, issuer: OwnerId) -> Self {
        Self {
            description: description.into(),
            issuer,
            date: None,
            kind: None,
        }
    }

    /// Set the reference date (defaults to the posting time).
    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Set a domain-specific transaction type.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn issuer(&self) -> &OwnerId {
        &self.issuer
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.date
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub(crate) fn set_issuer(&mut self, issuer: OwnerId) {
        self.issuer = issuer;
    }

    pub(crate) fn set_date(&mut self, date: DateTime<Utc>) {
        self.date = Some(date);
    }

    pub(crate) fn set_kind(&mut self, kind: Option<String>) {
        self.kind = kind;
    }
}

/// A movement of money: a source flow shared by one or more splits.
///
/// A transaction is:
/// - *split* when it has more than one split;
/// - *internal* when every split stays inside the source account's tree;
/// - *simple* when it is internal and not split.
///
/// Transactions are built and stored only by the posting functions of
/// [`Books`](crate::engine::Books), which validate them and write their ledger
/// entries atomically. They are never edited in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    source: CashFlow,
    splits: Vec<Split>,
    description: String,
    issuer: OwnerId,
    date: DateTime<Utc>,
    kind: Option<String>,
    is_confirmed: bool,
    references: BTreeSet<EntityRef>,
}

impl Transaction {
    pub(crate) fn new(source: CashFlow, splits: Vec<Split>, meta: TransactionMeta) -> Self {
        Self {
            id: TransactionId::generate(),
            source,
            splits,
            description: meta.description,
            issuer: meta.issuer,
            date: meta.date.unwrap_or_else(Utc::now),
            kind: meta.kind,
            is_confirmed: false,
            references: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn source(&self) -> &CashFlow {
        &self.source
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn issuer(&self) -> &OwnerId {
        &self.issuer
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn is_confirmed(&self) -> bool {
        self.is_confirmed
    }

    pub fn is_split(&self) -> bool {
        self.splits.len() > 1
    }

    pub fn is_internal(&self) -> bool {
        self.splits.iter().all(Split::is_internal)
    }

    pub fn is_simple(&self) -> bool {
        self.is_internal() && !self.is_split()
    }

    /// The metadata this transaction was posted with.
    pub fn meta(&self) -> TransactionMeta {
        TransactionMeta {
            description: self.description.clone(),
            issuer: self.issuer.clone(),
            date: Some(self.date),
            kind: self.kind.clone(),
        }
    }

    /// Source flow followed by every split's target flow.
    pub fn flows(&self) -> impl Iterator<Item = &CashFlow> {
        std::iter::once(&self.source).chain(self.splits.iter().map(Split::target))
    }

    /// Algebraic sum of all flows; zero for every valid transaction.
    pub fn flow_sum(&self) -> Decimal {
        self.flows().map(CashFlow::amount).sum()
    }

    /// Every account touched by this transaction, source first.
    pub fn accounts(&self) -> Vec<AccountId> {
        std::iter::once(self.source.account())
            .chain(self.splits.iter().flat_map(|s| s.accounts().into_iter().flatten()))
            .collect()
    }

    /// Mark the transaction as confirmed. Confirming twice is an error.
    pub fn confirm(&mut self) -> Result<()> {
        if self.is_confirmed {
            return Err(AccountingError::InvalidAccountingOperation(format!(
                "transaction {} had already been confirmed",
                self.id
            )));
        }
        self.is_confirmed = true;
        Ok(())
    }

    pub fn references(&self) -> &BTreeSet<EntityRef> {
        &self.references
    }

    pub fn refers_to(&self, reference: &EntityRef) -> bool {
        self.references.contains(reference)
    }

    pub(crate) fn add_reference(&mut self, reference: EntityRef) -> bool {
        self.references.insert(reference)
    }

    pub(crate) fn take_references(&mut self) -> BTreeSet<EntityRef> {
        std::mem::take(&mut self.references)
    }
}
