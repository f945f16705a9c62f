use crate::core::account_type::{AccountKind, AccountType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an account tree within a set of books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeId(pub(crate) u32);

impl TreeId {
    pub fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

/// Stable identifier of an account.
///
/// Accounts are stored in per-tree arenas; the identifier names the tree and
/// the slot. Identifiers are never reused while the tree exists, so they can
/// be held by splits and ledger entries that cross tree boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId {
    tree: TreeId,
    index: u32,
}

impl AccountId {
    pub(crate) fn new(tree: TreeId, index: u32) -> Self {
        Self { tree, index }
    }

    /// The tree this account belongs to.
    pub fn tree(self) -> TreeId {
        self.tree
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tree, self.index)
    }
}

/// A node in an account tree.
///
/// Accounts are created through [`AccountTree`](crate::core::tree::AccountTree)
/// and are immutable afterwards: name, parent and kind never change, so the
/// path is computed once at insertion time. Balances are not stored here;
/// they are derived from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    parent: Option<AccountId>,
    name: String,
    kind: AccountKind,
    is_placeholder: bool,
    path: String,
}

impl Account {
    pub(crate) fn new(
        id: AccountId,
        parent: Option<AccountId>,
        name: String,
        kind: AccountKind,
        is_placeholder: bool,
        path: String,
    ) -> Self {
        Self {
            id,
            parent,
            name,
            kind,
            is_placeholder,
            path,
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn tree(&self) -> TreeId {
        self.id.tree()
    }

    pub fn parent(&self) -> Option<AccountId> {
        self.parent
    }

    /// Empty for the root account only.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AccountKind {
        &self.kind
    }

    pub fn account_type(&self) -> AccountType {
        self.kind.base()
    }

    /// Placeholders group sub-accounts and cannot take part in transactions.
    pub fn is_placeholder(&self) -> bool {
        self.is_placeholder
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_stock(&self) -> bool {
        self.kind.is_stock()
    }

    pub fn is_flux(&self) -> bool {
        self.kind.is_flux()
    }

    /// Absolute path from the tree root, e.g. `/assets/bank`. The root's path
    /// is the bare separator.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.path, self.kind)
    }
}
