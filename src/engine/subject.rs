//! Lifecycle hooks binding economic subjects (people, suppliers, groups...)
//! to their account trees.
//!
//! Subjects are not owned by the engine. A subject type implements
//! [`EconomicSubject`]; its constructor calls [`Books::on_subject_created`]
//! and keeps the returned [`Accounting`] handle, and its teardown calls
//! [`Books::on_subject_deleted`].

use crate::core::account::{Account, TreeId};
use crate::core::entity::OwnerId;
use crate::core::error::{AccountingError, Result};
use crate::core::tree::AccountTree;
use crate::engine::books::Books;
use log::warn;
use rust_decimal::Decimal;

/// Something that can own an account tree.
pub trait EconomicSubject {
    /// Stable identity of the subject.
    fn owner_id(&self) -> OwnerId;

    /// Create the subject's own accounts. Called once, right after the root
    /// and the incomes/expenses accounts have been created.
    fn setup_accounting(&self, tree: &mut AccountTree) -> Result<()> {
        let _ = tree;
        Ok(())
    }
}

/// Handle on a subject's accounting, embedded in the subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Accounting {
    owner: OwnerId,
    tree: TreeId,
}

impl Accounting {
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn tree_id(&self) -> TreeId {
        self.tree
    }

    pub fn tree<'b>(&self, books: &'b Books) -> Result<&'b AccountTree> {
        let tree = books.tree_by_id(self.tree)?;
        if tree.owner() != &self.owner {
            return Err(AccountingError::not_found(format!(
                "account tree {} of {}",
                self.tree, self.owner
            )));
        }
        Ok(tree)
    }

    pub fn resolve<'b>(&self, books: &'b Books, path: &str) -> Result<&'b Account> {
        self.tree(books)?.resolve(path)
    }

    pub fn balance(&self, books: &Books, path: &str) -> Result<Decimal> {
        let account = self.resolve(books, path)?;
        Ok(books.balance(account.id()))
    }

    pub fn total_amount(&self, books: &Books) -> Result<Decimal> {
        Ok(self.tree(books)?.total_amount(books.ledger()))
    }
}

impl Books {
    /// Provision accounting for a newly created subject.
    ///
    /// If the subject's own setup fails, its tree is removed again and the
    /// error is returned.
    pub fn on_subject_created<S: EconomicSubject + ?Sized>(
        &mut self,
        subject: &S,
    ) -> Result<Accounting> {
        let owner = subject.owner_id();
        let tree = self.open_accounting(owner.clone())?;
        let handle = Accounting {
            owner: owner.clone(),
            tree: tree.id(),
        };
        if let Err(err) = subject.setup_accounting(tree) {
            warn!("accounting setup of {} failed: {}", owner, err);
            self.close_accounting(&owner)?;
            return Err(err);
        }
        Ok(handle)
    }

    /// Tear down the accounting of a deleted subject.
    pub fn on_subject_deleted<S: EconomicSubject + ?Sized>(&mut self, subject: &S) -> Result<()> {
        self.close_accounting(&subject.owner_id()).map(|_| ())
    }
}
