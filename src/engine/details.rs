use crate::core::account::AccountId;
use crate::core::transaction::Transaction;
use crate::engine::books::Books;
use std::fmt;

/// Multi-line, human-readable rendering of a transaction, with account
/// paths resolved against the books.
pub struct TransactionDetails<'a> {
    books: &'a Books,
    transaction: &'a Transaction,
}

impl Books {
    pub fn transaction_details<'a>(&'a self, transaction: &'a Transaction) -> TransactionDetails<'a> {
        TransactionDetails {
            books: self,
            transaction,
        }
    }
}

impl TransactionDetails<'_> {
    fn label(&self, account: Option<AccountId>) -> String {
        account.map_or_else(|| "-".to_string(), |id| self.books.account_label(id))
    }
}

impl fmt::Display for TransactionDetails<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tx = self.transaction;
        writeln!(f, "Transaction {}", tx.id())?;
        writeln!(f, "  issuer:       {}", tx.issuer())?;
        writeln!(f, "  issued on:    {}", tx.date().to_rfc3339())?;
        writeln!(f, "  description:  {}", tx.description())?;
        writeln!(f, "  kind:         {}", tx.kind().unwrap_or("-"))?;
        writeln!(f, "  source:       {}", self.label(Some(tx.source().account())))?;
        writeln!(f, "  amount:       {}", tx.source().amount())?;
        writeln!(
            f,
            "  split: {}  internal: {}  simple: {}  confirmed: {}",
            tx.is_split(),
            tx.is_internal(),
            tx.is_simple(),
            tx.is_confirmed()
        )?;
        for (n, split) in tx.splits().iter().enumerate() {
            writeln!(f, "  split #{}", n + 1)?;
            writeln!(f, "    exit point:  {}", self.label(split.exit_point()))?;
            writeln!(f, "    entry point: {}", self.label(split.entry_point()))?;
            writeln!(
                f,
                "    target:      {}",
                self.label(Some(split.target().account()))
            )?;
            writeln!(f, "    amount:      {}", split.amount())?;
            if !split.description().is_empty() {
                writeln!(f, "    description: {}", split.description())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::account_type::AccountType;
    use crate::core::entity::OwnerId;
    use crate::core::transaction::TransactionMeta;
    use crate::engine::books::Books;
    use rust_decimal_macros::dec;

    #[test]
    fn test_details_rendering() {
        let mut books = Books::new();
        let alice = OwnerId::new("person", "alice");
        books.open_accounting(alice.clone()).unwrap();
        let tree = books.tree_mut(&alice).unwrap();
        let wallet = tree.add_account("/", "wallet", AccountType::Asset, false).unwrap().id();
        let bank = tree.add_account("/", "bank", AccountType::Asset, false).unwrap().id();

        let tx = books
            .register_simple_transaction(
                wallet,
                bank,
                dec!(42),
                TransactionMeta::new("deposit", alice.clone()).with_kind("TRANSFER"),
            )
            .unwrap()
            .clone();

        let text = books.transaction_details(&tx).to_string();
        assert!(text.contains(&format!("Transaction {}", tx.id())));
        assert!(text.contains("issuer:       person:alice"));
        assert!(text.contains("kind:         TRANSFER"));
        assert!(text.contains("source:       person:alice/wallet"));
        assert!(text.contains("target:      person:alice/bank"));
        assert!(text.contains("exit point:  -"));
        assert!(text.contains("simple: true"));
    }
}
