use crate::core::error::{AccountingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The five basic account types.
///
/// Accounts are either *stock-like* (they hold money: assets and liabilities)
/// or *flux-like* (they relay money across the border of an account tree:
/// incomes and expenses). `Root` is reserved for tree roots and is neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Root,
    Income,
    Expense,
    Asset,
    Liability,
}

impl AccountType {
    pub const ALL: [AccountType; 5] = [
        AccountType::Root,
        AccountType::Income,
        AccountType::Expense,
        AccountType::Asset,
        AccountType::Liability,
    ];

    pub fn is_stock(self) -> bool {
        matches!(self, AccountType::Asset | AccountType::Liability)
    }

    pub fn is_flux(self) -> bool {
        matches!(self, AccountType::Income | AccountType::Expense)
    }

    pub fn name(self) -> &'static str {
        match self {
            AccountType::Root => "ROOT",
            AccountType::Income => "INCOME",
            AccountType::Expense => "EXPENSE",
            AccountType::Asset => "ASSET",
            AccountType::Liability => "LIABILITY",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccountType {
    type Err = AccountingError;

    fn from_str(s: &str) -> Result<Self> {
        AccountType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AccountingError::not_found(format!("basic account type '{}'", s)))
    }
}

/// A named account type deriving from one of the basic types.
///
/// Client code uses kinds to attach domain semantics to accounts
/// (`BANK`, `CASH`, `CREDIT_CARD`, ...). Every rule of the accounting
/// model is evaluated against [`AccountKind::base`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountKind {
    name: String,
    base: AccountType,
}

impl AccountKind {
    /// Kind names are stored upper case.
    pub fn new(name: impl AsRef<str>, base: AccountType) -> Self {
        Self {
            name: name.as_ref().trim().to_uppercase(),
            base,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> AccountType {
        self.base
    }

    pub fn is_stock(&self) -> bool {
        self.base.is_stock()
    }

    pub fn is_flux(&self) -> bool {
        self.base.is_flux()
    }
}

impl From<AccountType> for AccountKind {
    fn from(base: AccountType) -> Self {
        Self::new(base.name(), base)
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == self.base.name() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.base)
        }
    }
}

/// Registry of account kinds known to a set of books.
///
/// Always contains the five basic kinds; custom kinds are added with
/// [`AccountTypeRegistry::define`].
#[derive(Debug, Clone)]
pub struct AccountTypeRegistry {
    kinds: BTreeMap<String, AccountKind>,
}

impl AccountTypeRegistry {
    pub fn new() -> Self {
        let kinds = AccountType::ALL
            .into_iter()
            .map(|t| (t.name().to_string(), AccountKind::from(t)))
            .collect();
        Self { kinds }
    }

    /// Define a custom kind. Defining the same name twice with the same base
    /// returns the existing kind.
    pub fn define(&mut self, name: &str, base: AccountType) -> Result<AccountKind> {
        let kind = AccountKind::new(name, base);
        if kind.name().is_empty() {
            return Err(AccountingError::InvalidAccountingOperation(
                "account kind names must not be empty".to_string(),
            ));
        }
        match self.kinds.get(kind.name()) {
            Some(existing) if existing.base() == base => Ok(existing.clone()),
            Some(existing) => Err(AccountingError::already_exists(format!(
                "account kind '{}' with base type {}",
                existing.name(),
                existing.base()
            ))),
            None => {
                self.kinds.insert(kind.name().to_string(), kind.clone());
                Ok(kind)
            }
        }
    }

    /// Look up a kind by (case-insensitive) name.
    pub fn get(&self, name: &str) -> Result<&AccountKind> {
        self.kinds
            .get(&name.trim().to_uppercase())
            .ok_or_else(|| AccountingError::not_found(format!("account kind '{}'", name)))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &AccountKind> {
        self.kinds.values()
    }
}

impl Default for AccountTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
