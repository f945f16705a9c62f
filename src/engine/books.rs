use crate::config::{ConfigError, EngineConfig};
use crate::core::account::{Account, AccountId, TreeId};
use crate::core::account_type::{AccountKind, AccountType, AccountTypeRegistry};
use crate::core::entity::{EntityRef, OwnerId};
use crate::core::error::{AccountingError, Result};
use crate::core::flow::Split;
use crate::core::ledger::{Ledger, LedgerEntry};
use crate::core::transaction::{Transaction, TransactionId};
use crate::core::tree::AccountTree;
use chrono::{DateTime, Utc};
use log::info;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// The books of a community of economic subjects.
///
/// `Books` owns every account tree (one per owner), every posted
/// transaction and the ledgers of all accounts. It is the unit of work of
/// the engine: posting functions take `&mut self`, validate the whole
/// transaction against the current state, and only then write the
/// transaction and all its ledger entries. A rejected posting leaves the
/// books untouched.
///
/// Callers sharing one set of books across threads wrap it in a lock; the
/// exclusive borrow serializes ledger-entry numbering per account.
#[derive(Debug, Clone)]
pub struct Books {
    pub(crate) config: EngineConfig,
    kinds: AccountTypeRegistry,
    trees: HashMap<TreeId, AccountTree>,
    owners: HashMap<OwnerId, TreeId>,
    next_tree: u32,
    pub(crate) transactions: HashMap<TransactionId, Transaction>,
    pub(crate) ledger: Ledger,
}

impl Books {
    pub fn new() -> Self {
        Self::from_config(EngineConfig::default())
    }

    /// Books laid out according to `config`, which is validated first.
    pub fn with_config(config: EngineConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            kinds: AccountTypeRegistry::new(),
            trees: HashMap::new(),
            owners: HashMap::new(),
            next_tree: 0,
            transactions: HashMap::new(),
            ledger: Ledger::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Account kinds ---

    pub fn define_account_kind(&mut self, name: &str, base: AccountType) -> Result<AccountKind> {
        self.kinds.define(name, base)
    }

    pub fn account_kind(&self, name: &str) -> Result<&AccountKind> {
        self.kinds.get(name)
    }

    pub fn account_kinds(&self) -> &AccountTypeRegistry {
        &self.kinds
    }

    // --- Trees ---

    /// Register an empty account tree for `owner`. The root still has to be
    /// created with [`AccountTree::add_root_account`].
    pub fn create_tree(&mut self, owner: OwnerId) -> Result<&mut AccountTree> {
        let tree = self.new_tree(owner)?;
        Ok(self.insert_tree(tree))
    }

    /// Provision the accounting of a new subject: a tree with its root and
    /// the incomes/expenses accounts below it.
    pub fn open_accounting(&mut self, owner: OwnerId) -> Result<&mut AccountTree> {
        let mut tree = self.new_tree(owner)?;
        let root_path = tree.separator().to_string();
        tree.add_root_account()?;
        tree.add_account(
            &root_path,
            &self.config.incomes_account,
            AccountType::Income,
            false,
        )?;
        tree.add_account(
            &root_path,
            &self.config.expenses_account,
            AccountType::Expense,
            false,
        )?;
        info!("opened accounting for {} ({})", tree.owner(), tree.id());
        Ok(self.insert_tree(tree))
    }

    /// Remove `owner`'s tree. Trees whose accounts appear in any ledger
    /// cannot be removed.
    pub fn close_accounting(&mut self, owner: &OwnerId) -> Result<AccountTree> {
        let tree_id = *self
            .owners
            .get(owner)
            .ok_or_else(|| AccountingError::not_found(format!("account tree of {}", owner)))?;
        let tree = self.tree_by_id(tree_id)?;
        if let Some(account) = tree.accounts().find(|a| self.ledger.has_entries(a.id())) {
            return Err(AccountingError::InvalidAccountingOperation(format!(
                "cannot close accounting of {}: account '{}' has ledger entries",
                owner,
                account.path()
            )));
        }
        self.owners.remove(owner);
        let tree = self
            .trees
            .remove(&tree_id)
            .ok_or_else(|| AccountingError::not_found(format!("account tree {}", tree_id)))?;
        info!("closed accounting for {} ({})", owner, tree_id);
        Ok(tree)
    }

    fn new_tree(&mut self, owner: OwnerId) -> Result<AccountTree> {
        if self.owners.contains_key(&owner) {
            return Err(AccountingError::already_exists(format!(
                "account tree of {}",
                owner
            )));
        }
        let id = TreeId(self.next_tree);
        self.next_tree += 1;
        Ok(AccountTree::new(id, owner, self.config.path_separator))
    }

    fn insert_tree(&mut self, tree: AccountTree) -> &mut AccountTree {
        let id = tree.id();
        self.owners.insert(tree.owner().clone(), id);
        self.trees.entry(id).or_insert(tree)
    }

    pub fn has_tree(&self, owner: &OwnerId) -> bool {
        self.owners.contains_key(owner)
    }

    pub fn tree(&self, owner: &OwnerId) -> Result<&AccountTree> {
        let id = self
            .owners
            .get(owner)
            .ok_or_else(|| AccountingError::not_found(format!("account tree of {}", owner)))?;
        self.tree_by_id(*id)
    }

    pub fn tree_mut(&mut self, owner: &OwnerId) -> Result<&mut AccountTree> {
        let id = self
            .owners
            .get(owner)
            .ok_or_else(|| AccountingError::not_found(format!("account tree of {}", owner)))?;
        self.trees
            .get_mut(id)
            .ok_or_else(|| AccountingError::not_found(format!("account tree {}", id)))
    }

    pub fn tree_by_id(&self, id: TreeId) -> Result<&AccountTree> {
        self.trees
            .get(&id)
            .ok_or_else(|| AccountingError::not_found(format!("account tree {}", id)))
    }

    /// All trees, ordered by owner.
    pub fn trees(&self) -> Vec<&AccountTree> {
        let mut trees: Vec<&AccountTree> = self.trees.values().collect();
        trees.sort_by(|a, b| a.owner().cmp(b.owner()));
        trees
    }

    // --- Accounts ---

    pub fn account(&self, id: AccountId) -> Result<&Account> {
        self.tree_by_id(id.tree())?.account(id)
    }

    /// Resolve a path in `owner`'s tree.
    pub fn resolve(&self, owner: &OwnerId, path: &str) -> Result<&Account> {
        self.tree(owner)?.resolve(path)
    }

    /// Current balance of an account, recomputed from its ledger.
    pub fn balance(&self, account: AccountId) -> Decimal {
        self.ledger.balance(account)
    }

    /// Money held in `owner`'s tree (sum over stock-like accounts).
    pub fn total_amount(&self, owner: &OwnerId) -> Result<Decimal> {
        Ok(self.tree(owner)?.total_amount(&self.ledger))
    }

    /// Human-readable `owner:path` label of an account.
    pub fn account_label(&self, id: AccountId) -> String {
        match self.tree_by_id(id.tree()).and_then(|tree| Ok((tree.owner(), tree.account(id)?))) {
            Ok((owner, account)) => format!("{}{}", owner, account.path()),
            Err(_) => id.to_string(),
        }
    }

    // --- Transactions and ledger ---

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn transaction(&self, id: TransactionId) -> Result<&Transaction> {
        self.transactions
            .get(&id)
            .ok_or_else(|| AccountingError::not_found(format!("transaction {}", id)))
    }

    fn transaction_mut(&mut self, id: TransactionId) -> Result<&mut Transaction> {
        self.transactions
            .get_mut(&id)
            .ok_or_else(|| AccountingError::not_found(format!("transaction {}", id)))
    }

    /// All posted transactions, oldest first.
    pub fn transactions(&self) -> Vec<&Transaction> {
        let mut transactions: Vec<&Transaction> = self.transactions.values().collect();
        transactions.sort_by_key(|tx| (tx.date(), tx.id()));
        transactions
    }

    pub fn confirm_transaction(&mut self, id: TransactionId) -> Result<()> {
        self.transaction_mut(id)?.confirm()?;
        info!("confirmed transaction {}", id);
        Ok(())
    }

    /// Associate an external object (an invoice, an order...) with a transaction.
    pub fn add_reference(&mut self, id: TransactionId, reference: EntityRef) -> Result<()> {
        self.transaction_mut(id)?.add_reference(reference);
        Ok(())
    }

    pub fn add_references(
        &mut self,
        id: TransactionId,
        references: impl IntoIterator<Item = EntityRef>,
    ) -> Result<()> {
        let transaction = self.transaction_mut(id)?;
        for reference in references {
            transaction.add_reference(reference);
        }
        Ok(())
    }

    /// Transactions referring to *all* of `references`, oldest first.
    /// An empty reference list matches nothing.
    pub fn transactions_by_reference(&self, references: &[EntityRef]) -> Vec<&Transaction> {
        if references.is_empty() {
            return Vec::new();
        }
        self.transactions()
            .into_iter()
            .filter(|tx| references.iter().all(|r| tx.refers_to(r)))
            .collect()
    }

    pub fn entries_for_transaction(&self, id: TransactionId) -> Vec<&LedgerEntry> {
        self.ledger.entries_for_transaction(id)
    }

    pub fn entry_split(&self, entry: &LedgerEntry) -> Result<&Split> {
        entry.split(self.transaction(entry.transaction())?)
    }

    pub fn entry_description(&self, entry: &LedgerEntry) -> Result<&str> {
        Ok(entry.description(self.transaction(entry.transaction())?))
    }

    pub fn entry_date(&self, entry: &LedgerEntry) -> Result<DateTime<Utc>> {
        Ok(self.transaction(entry.transaction())?.date())
    }

    pub fn entry_issuer(&self, entry: &LedgerEntry) -> Result<&OwnerId> {
        Ok(self.transaction(entry.transaction())?.issuer())
    }
}

impl Default for Books {
    fn default() -> Self {
        Self::new()
    }
}
