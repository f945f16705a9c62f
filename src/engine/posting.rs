//! The posting API: the only way transactions enter the books.
//!
//! Every function builds a [`Transaction`], checks it against all posting
//! rules and, only if it is valid, stores it and writes one ledger entry per
//! touched account:
//!
//! 1. source account: `-source.amount`;
//! 2. exit point: `split.amount` if it is an EXPENSE account, `-split.amount` otherwise;
//! 3. entry point: `split.amount` if it is an INCOME account, `-split.amount` otherwise;
//! 4. target account: `split.amount`.

use crate::core::account::AccountId;
use crate::core::account_type::AccountType;
use crate::core::error::Result;
use crate::core::flow::{CashFlow, Split, SplitPath};
use crate::core::transaction::{Transaction, TransactionMeta};
use crate::engine::books::Books;
use log::{info, warn};
use rust_decimal::Decimal;

impl Books {
    /// Post a transaction with any number of splits.
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
    /// let rent = tree.add_account("/", "rent", AccountType::Asset, false).unwrap().id();
    /// let food = tree.add_account("/", "food", AccountType::Asset, false).unwrap().id();
    ///
    /// let tx = books
    ///     .register_split_transaction(
    ///         CashFlow::new(wallet, dec!(100)),
    ///         vec![
    ///             Split::internal(CashFlow::new(rent, dec!(-70))).with_description("rent"),
    ///             Split::internal(CashFlow::new(food, dec!(-30))).with_description("food"),
    ///         ],
    ///         TransactionMeta::new("monthly budget", alice.clone()),
    ///     )
    ///     .unwrap();
    /// assert!(tx.is_split());
    /// assert_eq!(books.balance(wallet), dec!(-100));
    /// assert_eq!(books.balance(food), dec!(30));
    /// ```
    pub fn register_split_transaction(
        &mut self,
        source: CashFlow,
        splits: Vec<Split>,
        meta: TransactionMeta,
    ) -> Result<&Transaction> {
        self.post(Transaction::new(source, splits, meta))
    }

    /// Move `amount` from `source_account` to `target_account` in another
    /// tree, leaving through `exit_point` and entering through `entry_point`.
    pub fn register_transaction(
        &mut self,
        source_account: AccountId,
        exit_point: AccountId,
        entry_point: AccountId,
        target_account: AccountId,
        amount: Decimal,
        meta: TransactionMeta,
    ) -> Result<&Transaction> {
        let source = CashFlow::new(source_account, amount);
        let target = CashFlow::new(target_account, -amount);
        self.post(Transaction::new(
            source,
            vec![Split::external(exit_point, entry_point, target)],
            meta,
        ))
    }

    /// Distribute `source` to `targets`, all within the source's tree.
    pub fn register_internal_transaction(
        &mut self,
        source: CashFlow,
        targets: Vec<CashFlow>,
        meta: TransactionMeta,
    ) -> Result<&Transaction> {
        let splits = targets.into_iter().map(Split::internal).collect();
        self.post(Transaction::new(source, splits, meta))
    }

    /// Move `amount` between two accounts of the same tree.
    pub fn register_simple_transaction(
        &mut self,
        source_account: AccountId,
        target_account: AccountId,
        amount: Decimal,
        meta: TransactionMeta,
    ) -> Result<&Transaction> {
        self.register_internal_transaction(
            CashFlow::new(source_account, amount),
            vec![CashFlow::new(target_account, -amount)],
            meta,
        )
    }

    pub(crate) fn post(&mut self, transaction: Transaction) -> Result<&Transaction> {
        if let Err(err) = self.validate(&transaction) {
            warn!(
                "rejected transaction: {}\n{}",
                err,
                self.transaction_details(&transaction)
            );
            return Err(err);
        }
        Ok(self.commit(transaction))
    }

    /// Store an already validated transaction and write its ledger entries.
    pub(crate) fn commit(&mut self, transaction: Transaction) -> &Transaction {
        let id = transaction.id();
        let source = *transaction.source();
        self.ledger.post(source.account(), id, -source.amount());

        for split in transaction.splits() {
            let amount = split.amount();
            if let SplitPath::External {
                exit_point,
                entry_point,
            } = *split.path()
            {
                let exit_amount = if self.has_type(exit_point, AccountType::Expense) {
                    amount
                } else {
                    -amount
                };
                let entry_amount = if self.has_type(entry_point, AccountType::Income) {
                    amount
                } else {
                    -amount
                };
                self.ledger.post(exit_point, id, exit_amount);
                self.ledger.post(entry_point, id, entry_amount);
            }
            self.ledger.post(split.target().account(), id, amount);
        }

        info!(
            "posted transaction {} ({} split(s), {} from {})",
            id,
            transaction.splits().len(),
            source.amount(),
            self.account_label(source.account())
        );
        self.transactions.entry(id).or_insert(transaction)
    }

    fn has_type(&self, account: AccountId, account_type: AccountType) -> bool {
        self.account(account)
            .map_or(false, |a| a.account_type() == account_type)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::account::AccountId;
    use crate::core::account_type::AccountType;
    use crate::core::entity::OwnerId;
    use crate::core::error::{AccountingError, TransactionRule};
    use crate::core::flow::{CashFlow, Split};
    use crate::core::transaction::TransactionMeta;
    use crate::engine::books::Books;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    struct Fixture {
        books: Books,
        alice: OwnerId,
        wallet: AccountId,
        savings: AccountId,
        alice_expenses: AccountId,
        shop_incomes: AccountId,
        till: AccountId,
        vault: AccountId,
    }

    fn fixture() -> Fixture {
        let mut books = Books::new();
        let alice = OwnerId::new("person", "alice");
        let shop = OwnerId::new("supplier", "shop");

        books.open_accounting(alice.clone()).unwrap();
        let tree = books.tree_mut(&alice).unwrap();
        let wallet = tree.add_account("/", "wallet", AccountType::Asset, false).unwrap().id();
        let savings = tree.add_account("/", "savings", AccountType::Asset, false).unwrap().id();
        let vault = tree.add_account("/", "vault", AccountType::Asset, true).unwrap().id();
        let alice_expenses = tree.resolve("/expenses").unwrap().id();

        books.open_accounting(shop.clone()).unwrap();
        let tree = books.tree_mut(&shop).unwrap();
        let till = tree.add_account("/", "till", AccountType::Asset, false).unwrap().id();
        let shop_incomes = tree.resolve("/incomes").unwrap().id();

        Fixture {
            books,
            alice,
            wallet,
            savings,
            alice_expenses,
            shop_incomes,
            till,
            vault,
        }
    }

    fn meta(f: &Fixture) -> TransactionMeta {
        TransactionMeta::new("test", f.alice.clone())
    }

    #[test]
    fn test_simple_transaction_entries() {
        let mut f = fixture();
        let meta = meta(&f);
        let tx = f
            .books
            .register_simple_transaction(f.wallet, f.savings, dec!(10.5), meta)
            .unwrap()
            .id();

        let entries = f.books.entries_for_transaction(tx);
        assert_eq!(entries.len(), 2);
        assert_eq!(f.books.balance(f.wallet), dec!(-10.5));
        assert_eq!(f.books.balance(f.savings), dec!(10.5));
        assert!(entries.iter().all(|e| e.entry_id() == 1));
    }

    #[test]
    fn test_cross_tree_entries() {
        let mut f = fixture();
        let meta = meta(&f);
        f.books
            .register_transaction(
                f.wallet,
                f.alice_expenses,
                f.shop_incomes,
                f.till,
                dec!(7.2),
                meta,
            )
            .unwrap();

        assert_eq!(f.books.balance(f.wallet), dec!(-7.2));
        assert_eq!(f.books.balance(f.alice_expenses), dec!(7.2));
        assert_eq!(f.books.balance(f.shop_incomes), dec!(7.2));
        assert_eq!(f.books.balance(f.till), dec!(7.2));
        assert_eq!(f.books.ledger().len(), 4);
    }

    #[test]
    fn test_reversed_flux_signs() {
        let mut f = fixture();
        let shop = OwnerId::new("supplier", "shop");
        let shop_expenses = f.books.resolve(&shop, "/expenses").unwrap().id();
        let alice_incomes = f.books.resolve(&f.alice, "/incomes").unwrap().id();
        let meta = TransactionMeta::new("refund", shop.clone());

        f.books
            .register_transaction(f.till, shop_expenses, alice_incomes, f.wallet, dec!(2), meta)
            .unwrap();
        assert_eq!(f.books.balance(shop_expenses), dec!(2));
        assert_eq!(f.books.balance(alice_incomes), dec!(2));

        // A refund routed through the "wrong" flux accounts reverses their sign.
        let meta = TransactionMeta::new("odd refund", shop.clone());
        f.books
            .register_transaction(
                f.till,
                f.shop_incomes,
                f.alice_expenses,
                f.wallet,
                dec!(1),
                meta,
            )
            .unwrap();
        assert_eq!(f.books.balance(f.shop_incomes), dec!(-1));
        assert_eq!(f.books.balance(f.alice_expenses), dec!(-1));
    }

    #[test]
    fn test_internal_transaction_entries() {
        let mut f = fixture();
        let meta = meta(&f);
        let tx = f
            .books
            .register_internal_transaction(
                CashFlow::new(f.wallet, dec!(5)),
                vec![
                    CashFlow::new(f.savings, dec!(-3)),
                    CashFlow::new(f.wallet, dec!(-2)),
                ],
                meta,
            )
            .unwrap()
            .id();

        assert_eq!(f.books.entries_for_transaction(tx).len(), 3);
        let ids: Vec<u64> = f
            .books
            .ledger()
            .entries_for_account(f.wallet)
            .map(|e| e.entry_id())
            .collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(f.books.balance(f.wallet), dec!(-3));
    }

    #[test]
    fn test_rejections_write_nothing() {
        let mut f = fixture();
        let meta = meta(&f);
        let unbalanced = f.books.register_internal_transaction(
            CashFlow::new(f.wallet, dec!(5)),
            vec![CashFlow::new(f.savings, dec!(-4))],
            meta.clone(),
        );
        assert_eq!(
            unbalanced.unwrap_err().transaction_rule(),
            Some(&TransactionRule::ConservationOfMoney(dec!(1)))
        );

        let placeholder =
            f.books
                .register_simple_transaction(f.wallet, f.vault, dec!(1), meta.clone());
        assert_eq!(
            placeholder.unwrap_err(),
            AccountingError::MalformedTransaction(TransactionRule::PlaceholderAccount(f.vault))
        );

        let flux_source = f.books.register_simple_transaction(
            f.alice_expenses,
            f.savings,
            dec!(1),
            meta.clone(),
        );
        assert!(matches!(
            flux_source.unwrap_err().transaction_rule(),
            Some(TransactionRule::FlowNotStock(_))
        ));

        let foreign_target =
            f.books
                .register_simple_transaction(f.wallet, f.till, dec!(1), meta.clone());
        assert!(matches!(
            foreign_target.unwrap_err().transaction_rule(),
            Some(TransactionRule::ForeignInternalTarget(_))
        ));

        let no_splits = f.books.register_internal_transaction(
            CashFlow::new(f.wallet, Decimal::ZERO),
            vec![],
            meta.clone(),
        );
        assert_eq!(
            no_splits.unwrap_err().transaction_rule(),
            Some(&TransactionRule::NoSplits)
        );

        assert!(f.books.ledger().is_empty());
        assert!(f.books.transactions().is_empty());
    }

    #[test]
    fn test_external_split_rules() {
        let mut f = fixture();
        let meta = meta(&f);
        let bad_exit = f.books.register_transaction(
            f.wallet,
            f.savings,
            f.shop_incomes,
            f.till,
            dec!(1),
            meta.clone(),
        );
        assert_eq!(
            bad_exit.unwrap_err().transaction_rule(),
            Some(&TransactionRule::ExitPointNotFlux(f.savings))
        );

        let foreign_exit = f.books.register_transaction(
            f.wallet,
            f.shop_incomes,
            f.shop_incomes,
            f.till,
            dec!(1),
            meta.clone(),
        );
        assert_eq!(
            foreign_exit.unwrap_err().transaction_rule(),
            Some(&TransactionRule::ForeignExitPoint(f.shop_incomes))
        );

        let mismatch = f.books.register_split_transaction(
            CashFlow::new(f.wallet, dec!(1)),
            vec![Split::external(
                f.alice_expenses,
                f.shop_incomes,
                CashFlow::new(f.savings, dec!(-1)),
            )],
            meta.clone(),
        );
        assert!(matches!(
            mismatch.unwrap_err().transaction_rule(),
            Some(TransactionRule::EntryPointTargetMismatch { .. })
        ));
        assert!(f.books.ledger().is_empty());
    }

    #[test]
    fn test_kind_restrictions() {
        let config = crate::config::EngineConfig {
            transaction_kinds: vec!["PAYMENT".to_string()],
            ..Default::default()
        };
        let mut books = Books::with_config(config).unwrap();
        let alice = OwnerId::new("person", "alice");
        books.open_accounting(alice.clone()).unwrap();
        let tree = books.tree_mut(&alice).unwrap();
        let a = tree.add_account("/", "a", AccountType::Asset, false).unwrap().id();
        let b = tree.add_account("/", "b", AccountType::Asset, false).unwrap().id();

        let meta = TransactionMeta::new("x", alice.clone());
        assert!(books
            .register_simple_transaction(a, b, dec!(1), meta.clone().with_kind("PAYMENT"))
            .is_ok());
        assert_eq!(
            books
                .register_simple_transaction(a, b, dec!(1), meta.with_kind("GIFT"))
                .unwrap_err()
                .transaction_rule(),
            Some(&TransactionRule::KindNotAllowed("GIFT".to_string()))
        );
    }
}
