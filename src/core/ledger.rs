use crate::core::account::AccountId;
use crate::core::error::{AccountingError, Result};
use crate::core::flow::Split;
use crate::core::transaction::{Transaction, TransactionId};
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One posted amount against one account, arising from one transaction.
///
/// For stock-like accounts an entry records a change of the money held;
/// for flux-like accounts it records money flowing through the account.
///
/// `entry_id` numbers the entries of a single account: the n-th entry
/// written against an account gets `entry_id == n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    account: AccountId,
    transaction: TransactionId,
    entry_id: u64,
    amount: Decimal,
}

impl LedgerEntry {
    pub fn account(&self) -> AccountId {
        self.account
    }

    pub fn transaction(&self) -> TransactionId {
        self.transaction
    }

    pub fn entry_id(&self) -> u64 {
        self.entry_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// The split of `transaction` this entry's account belongs to.
    ///
    /// A non-split transaction has a single, trivial split which is always
    /// returned. For split transactions the source account belongs to no
    /// split, so asking for it is an error.
    pub fn split<'t>(&self, transaction: &'t Transaction) -> Result<&'t Split> {
        self.check_transaction(transaction)?;
        if !transaction.is_split() {
            return transaction.splits().first().ok_or_else(|| {
                AccountingError::InvalidAccountingOperation(format!(
                    "transaction {} has no splits",
                    transaction.id()
                ))
            });
        }
        if self.account == transaction.source().account() {
            return Err(AccountingError::InvalidAccountingOperation(
                "source accounts don't belong to any split".to_string(),
            ));
        }
        transaction
            .splits()
            .iter()
            .find(|split| split.involves(self.account))
            .ok_or_else(|| {
                AccountingError::InvalidAccountingOperation(format!(
                    "account {} is not involved in any split of transaction {}",
                    self.account,
                    transaction.id()
                ))
            })
    }

    /// The split memo for split transactions (except on the source account),
    /// the transaction description otherwise.
    pub fn description<'t>(&self, transaction: &'t Transaction) -> &'t str {
        if !transaction.is_split() || self.account == transaction.source().account() {
            return transaction.description();
        }
        self.split(transaction)
            .map(Split::description)
            .unwrap_or_else(|_| transaction.description())
    }

    fn check_transaction(&self, transaction: &Transaction) -> Result<()> {
        if transaction.id() != self.transaction {
            return Err(AccountingError::InvalidAccountingOperation(format!(
                "ledger entry belongs to transaction {}, not {}",
                self.transaction,
                transaction.id()
            )));
        }
        Ok(())
    }
}

/// Per-account ledgers for every account in a set of books.
///
/// Entries are keyed by `(account, entry_id)`, so two entries can never
/// share an id within one account's ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(with = "entries_serde")]
    entries: BTreeMap<(AccountId, u64), LedgerEntry>,
}

mod entries_serde {
    use super::*;
    use serde::de::{self, SeqAccess, Visitor};
    use serde::ser::SerializeSeq;

    pub fn serialize<S: serde::Serializer>(
        entries: &BTreeMap<(AccountId, u64), LedgerEntry>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(entries.len()))?;
        for entry in entries.values() {
            seq.serialize_element(entry)?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<BTreeMap<(AccountId, u64), LedgerEntry>, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = BTreeMap<(AccountId, u64), LedgerEntry>;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a list of ledger entries")
            }
            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut map = BTreeMap::new();
                while let Some(entry) = access.next_element::<LedgerEntry>()? {
                    let key = (entry.account, entry.entry_id);
                    if map.insert(key, entry).is_some() {
                        return Err(de::Error::custom(format!(
                            "duplicate entry {} for account {}",
                            key.1, key.0
                        )));
                    }
                }
                Ok(map)
            }
        }
        deserializer.deserialize_seq(V)
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next entry written against `account` will receive.
    pub fn next_entry_id(&self, account: AccountId) -> u64 {
        self.entries_for_account(account)
            .next_back()
            .map_or(1, |entry| entry.entry_id + 1)
    }

    /// Append an entry to `account`'s ledger.
    pub(crate) fn post(
        &mut self,
        account: AccountId,
        transaction: TransactionId,
        amount: Decimal,
    ) -> &LedgerEntry {
        let entry_id = self.next_entry_id(account);
        debug!(
            "ledger entry {} on {}: {} (transaction {})",
            entry_id, account, amount, transaction
        );
        self.entries
            .entry((account, entry_id))
            .or_insert(LedgerEntry {
                account,
                transaction,
                entry_id,
                amount,
            })
    }

    /// Entries of one account, ordered by entry id.
    pub fn entries_for_account(
        &self,
        account: AccountId,
    ) -> impl DoubleEndedIterator<Item = &LedgerEntry> {
        self.entries
            .range((account, 0)..=(account, u64::MAX))
            .map(|(_, entry)| entry)
    }

    pub fn entries_for_transaction(&self, transaction: TransactionId) -> Vec<&LedgerEntry> {
        self.entries
            .values()
            .filter(|entry| entry.transaction == transaction)
            .collect()
    }

    /// Signed sum of every entry posted against `account`.
    ///
    /// Always computed from the stored entries, so it reflects every posting
    /// made so far.
    pub fn balance(&self, account: AccountId) -> Decimal {
        self.entries_for_account(account).map(|e| e.amount).sum()
    }

    pub fn has_entries(&self, account: AccountId) -> bool {
        self.entries_for_account(account).next().is_some()
    }

    /// Remove and return every entry written by `transaction`.
    pub(crate) fn remove_transaction(&mut self, transaction: TransactionId) -> Vec<LedgerEntry> {
        let keys: Vec<(AccountId, u64)> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.transaction == transaction)
            .map(|(key, _)| *key)
            .collect();
        keys.into_iter()
            .filter_map(|key| self.entries.remove(&key))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::account::TreeId;
    use crate::core::entity::OwnerId;
    use crate::core::flow::CashFlow;
    use crate::core::transaction::TransactionMeta;
    use rust_decimal_macros::dec;

    fn id(tree: u32, index: u32) -> AccountId {
        AccountId::new(TreeId(tree), index)
    }

    #[test]
    fn test_entry_ids_per_account() {
        let mut ledger = Ledger::new();
        let t1 = TransactionId::generate();
        let t2 = TransactionId::generate();

        assert_eq!(ledger.post(id(0, 1), t1, dec!(-5)).entry_id(), 1);
        assert_eq!(ledger.post(id(0, 2), t1, dec!(5)).entry_id(), 1);
        assert_eq!(ledger.post(id(0, 1), t2, dec!(-3)).entry_id(), 2);
        assert_eq!(ledger.next_entry_id(id(0, 1)), 3);
        assert_eq!(ledger.next_entry_id(id(0, 9)), 1);
    }

    #[test]
    fn test_balance() {
        let mut ledger = Ledger::new();
        let tx = TransactionId::generate();
        ledger.post(id(0, 1), tx, dec!(-10.5));
        ledger.post(id(0, 1), tx, dec!(4));
        assert_eq!(ledger.balance(id(0, 1)), dec!(-6.5));
        assert_eq!(ledger.balance(id(0, 2)), Decimal::ZERO);
        assert!(ledger.has_entries(id(0, 1)));
        assert!(!ledger.has_entries(id(0, 2)));
    }

    #[test]
    fn test_remove_transaction() {
        let mut ledger = Ledger::new();
        let t1 = TransactionId::generate();
        let t2 = TransactionId::generate();
        ledger.post(id(0, 1), t1, dec!(-1));
        ledger.post(id(0, 2), t1, dec!(1));
        ledger.post(id(0, 1), t2, dec!(-2));

        let removed = ledger.remove_transaction(t1);
        assert_eq!(removed.len(), 2);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.entries_for_transaction(t1).is_empty());
        assert_eq!(ledger.balance(id(0, 1)), dec!(-2));
    }

    #[test]
    fn test_entry_split_and_description() {
        let source = id(0, 1);
        let tx = Transaction::new(
            CashFlow::new(source, dec!(10)),
            vec![
                Split::internal(CashFlow::new(id(0, 2), dec!(-4))).with_description("rent"),
                Split::internal(CashFlow::new(id(0, 3), dec!(-6))).with_description("food"),
            ],
            TransactionMeta::new("monthly", OwnerId::new("person", "alice")),
        );
        let mut ledger = Ledger::new();
        let on_source = ledger.post(source, tx.id(), dec!(-10)).clone();
        let on_food = ledger.post(id(0, 3), tx.id(), dec!(6)).clone();

        assert!(matches!(
            on_source.split(&tx),
            Err(AccountingError::InvalidAccountingOperation(_))
        ));
        assert_eq!(on_source.description(&tx), "monthly");
        assert_eq!(on_food.split(&tx).unwrap().description(), "food");
        assert_eq!(on_food.description(&tx), "food");
    }

    #[test]
    fn test_entry_split_of_non_split_transaction() {
        let source = id(0, 1);
        let tx = Transaction::new(
            CashFlow::new(source, dec!(3)),
            vec![Split::internal(CashFlow::new(id(0, 2), dec!(-3))).with_description("memo")],
            TransactionMeta::new("transfer", OwnerId::new("person", "alice")),
        );
        let mut ledger = Ledger::new();
        let entry = ledger.post(source, tx.id(), dec!(-3)).clone();
        assert_eq!(entry.split(&tx).unwrap(), &tx.splits()[0]);
        assert_eq!(entry.description(&tx), "transfer");
    }

    #[test]
    fn test_ledger_serde() {
        let mut ledger = Ledger::new();
        let tx = TransactionId::generate();
        ledger.post(id(0, 1), tx, dec!(-1.25));
        ledger.post(id(1, 4), tx, dec!(1.25));

        let json = serde_json::to_string(&ledger).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["entries"].as_array().unwrap().len(), 2);

        let back: Ledger = serde_json::from_str(&json).unwrap();
        assert_eq!(back.balance(id(1, 4)), dec!(1.25));
    }
}
