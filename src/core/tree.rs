use crate::core::account::{Account, AccountId, TreeId};
use crate::core::account_type::{AccountKind, AccountType};
use crate::core::entity::OwnerId;
use crate::core::error::{AccountRule, AccountingError, Result};
use crate::core::ledger::Ledger;
use log::debug;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// The hierarchy of accounts owned by one economic subject.
///
/// A tree has exactly one root (created by [`AccountTree::add_root_account`]
/// and never removed); every other account hangs below it and is addressed
/// by a separator-delimited path such as `/assets/bank`.
///
/// Insertion enforces the structural rules of the accounting model:
///
/// - stock-like and flux-like subtrees never mix below the root;
/// - only the root has an empty name, no name contains the separator, and
///   no name starts or ends with whitespace;
/// - siblings have distinct names.
///
/// # Examples
///
/// ```
/// use accounting_engine::prelude::*;
///
/// let mut books = Books::new();
/// let alice = OwnerId::new("person", "alice");
/// let tree = books.create_tree(alice).unwrap();
/// tree.add_root_account().unwrap();
/// tree.add_account("/", "assets", AccountType::Asset, true).unwrap();
/// tree.add_account("/assets", "bank", AccountType::Asset, false).unwrap();
///
/// let bank = tree.resolve(" /assets/bank ").unwrap();
/// assert_eq!(bank.path(), "/assets/bank");
/// ```
#[derive(Debug, Clone)]
pub struct AccountTree {
    id: TreeId,
    owner: OwnerId,
    separator: char,
    accounts: Vec<Account>,
    /// parent -> (child name -> child)
    children: HashMap<AccountId, BTreeMap<String, AccountId>>,
}

impl AccountTree {
    pub(crate) fn new(id: TreeId, owner: OwnerId, separator: char) -> Self {
        Self {
            id,
            owner,
            separator,
            accounts: Vec::new(),
            children: HashMap::new(),
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// The unique account without a parent.
    pub fn root(&self) -> Result<&Account> {
        // the root is always the first account inserted
        self.accounts
            .first()
            .filter(|account| account.is_root())
            .ok_or_else(|| AccountingError::MalformedTree {
                owner: self.owner.clone(),
                reason: "no root account was created",
            })
    }

    pub fn account(&self, id: AccountId) -> Result<&Account> {
        if id.tree() != self.id {
            return Err(AccountingError::not_found(format!(
                "account {} in tree {}",
                id, self.id
            )));
        }
        self.accounts
            .get(id.index())
            .ok_or_else(|| AccountingError::not_found(format!("account {}", id)))
    }

    pub fn contains(&self, id: AccountId) -> bool {
        id.tree() == self.id && id.index() < self.accounts.len()
    }

    /// All accounts, root first, in insertion order.
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Find the account living at `path`.
    ///
    /// Surrounding whitespace is ignored. A valid path starts with a single
    /// separator, uses single separators between names, and does not end
    /// with a separator unless it is the bare separator (the root).
    pub fn resolve(&self, path: &str) -> Result<&Account> {
        let components = self.split_path(path)?;
        let mut current = self.root()?;
        for name in components {
            current = self.get_child(current.id(), name).map_err(|_| {
                AccountingError::not_found(format!(
                    "account '{}' in tree of {}",
                    path.trim(),
                    self.owner
                ))
            })?;
        }
        Ok(current)
    }

    fn split_path<'p>(&self, raw: &'p str) -> Result<Vec<&'p str>> {
        let path = raw.trim();
        let sep = self.separator;
        let rest = path
            .strip_prefix(sep)
            .ok_or_else(|| AccountingError::malformed_path(raw, "path must start with the separator"))?;
        if rest.is_empty() {
            return Ok(Vec::new());
        }
        if rest.ends_with(sep) {
            return Err(AccountingError::malformed_path(
                raw,
                "path must not end with the separator",
            ));
        }
        let components: Vec<&str> = rest.split(sep).collect();
        if components.iter().any(|c| c.is_empty()) {
            return Err(AccountingError::malformed_path(
                raw,
                "path contains consecutive separators",
            ));
        }
        Ok(components)
    }

    pub fn get_child(&self, parent: AccountId, name: &str) -> Result<&Account> {
        let parent = self.account(parent)?;
        self.children
            .get(&parent.id())
            .and_then(|names| names.get(name))
            .map(|id| &self.accounts[id.index()])
            .ok_or_else(|| {
                AccountingError::not_found(format!(
                    "child '{}' of account '{}'",
                    name,
                    parent.path()
                ))
            })
    }

    /// Direct children of `parent`, ordered by name.
    pub fn get_children(&self, parent: AccountId) -> Vec<&Account> {
        self.children
            .get(&parent)
            .map(|names| names.values().map(|id| &self.accounts[id.index()]).collect())
            .unwrap_or_default()
    }

    /// Create the root account (type ROOT, placeholder, empty name).
    pub fn add_root_account(&mut self) -> Result<&Account> {
        if !self.accounts.is_empty() {
            return Err(AccountingError::already_exists(format!(
                "root account for {}",
                self.owner
            )));
        }
        let root = Account::new(
            AccountId::new(self.id, 0),
            None,
            String::new(),
            AccountType::Root.into(),
            true,
            self.separator.to_string(),
        );
        debug!("created root account of {} ({})", self.owner, self.id);
        self.accounts.push(root);
        Ok(&self.accounts[0])
    }

    /// Resolve `parent_path` and add a new child account below it.
    pub fn add_account(
        &mut self,
        parent_path: &str,
        name: &str,
        kind: impl Into<AccountKind>,
        is_placeholder: bool,
    ) -> Result<&Account> {
        let parent = self.resolve(parent_path)?.id();
        self.add_child(parent, name, kind, is_placeholder)
    }

    /// Attach a new account below `parent`.
    pub fn add_child(
        &mut self,
        parent: AccountId,
        name: &str,
        kind: impl Into<AccountKind>,
        is_placeholder: bool,
    ) -> Result<&Account> {
        let kind = kind.into();
        if parent.tree() != self.id {
            return Err(AccountingError::MalformedAccount {
                path: name.to_string(),
                rule: AccountRule::ForeignParent,
            });
        }
        let parent = self.account(parent)?;
        let path = if parent.is_root() {
            format!("{}{}", self.separator, name)
        } else {
            format!("{}{}{}", parent.path(), self.separator, name)
        };

        if self.get_child(parent.id(), name).is_ok() {
            return Err(AccountingError::already_exists(format!("account '{}'", path)));
        }
        if let Err(rule) = self.check_account_rules(parent, name, &kind) {
            return Err(AccountingError::MalformedAccount { path, rule });
        }

        let parent_id = parent.id();
        let id = AccountId::new(self.id, self.accounts.len() as u32);
        debug!("created account {} [{}] for {}", path, kind, self.owner);
        self.accounts.push(Account::new(
            id,
            Some(parent_id),
            name.to_string(),
            kind,
            is_placeholder,
            path,
        ));
        self.children
            .entry(parent_id)
            .or_default()
            .insert(name.to_string(), id);
        Ok(&self.accounts[id.index()])
    }

    fn check_account_rules(
        &self,
        parent: &Account,
        name: &str,
        kind: &AccountKind,
    ) -> std::result::Result<(), AccountRule> {
        if name.is_empty() {
            return Err(AccountRule::EmptyName);
        }
        if name.trim() != name {
            return Err(AccountRule::SurroundingWhitespace);
        }
        if name.contains(self.separator) {
            return Err(AccountRule::SeparatorInName(self.separator));
        }
        if kind.base() == AccountType::Root {
            return Err(AccountRule::MisplacedRootType);
        }
        if kind.is_stock() && !(parent.is_stock() || parent.is_root()) {
            return Err(AccountRule::StockUnderFlux);
        }
        if kind.is_flux() && !(parent.is_flux() || parent.is_root()) {
            return Err(AccountRule::FluxUnderStock);
        }
        Ok(())
    }

    /// Total money stored in this tree: the sum of the balances of all
    /// stock-like accounts. Flux-like accounts only relay money.
    pub fn total_amount(&self, ledger: &Ledger) -> Decimal {
        self.accounts
            .iter()
            .filter(|account| account.is_stock())
            .map(|account| ledger.balance(account.id()))
            .sum()
    }
}
