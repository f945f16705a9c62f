use crate::core::account::{Account, AccountId};
use crate::core::error::{AccountingError, Result, TransactionRule};
use crate::core::flow::{Split, SplitPath};
use crate::core::transaction::Transaction;
use crate::engine::books::Books;

fn malformed(rule: TransactionRule) -> AccountingError {
    AccountingError::MalformedTransaction(rule)
}

impl Books {
    /// Check `transaction` against every posting rule and the current state
    /// of the books. Nothing is written.
    pub(crate) fn validate(&self, transaction: &Transaction) -> Result<()> {
        if let Some(kind) = transaction.kind() {
            if !self.config.allows_kind(kind) {
                return Err(malformed(TransactionRule::KindNotAllowed(kind.to_string())));
            }
        }
        if transaction.splits().is_empty() {
            return Err(malformed(TransactionRule::NoSplits));
        }
        for id in transaction.accounts() {
            self.known_account(id)?;
        }

        let source = self.known_account(transaction.source().account())?;
        if !source.is_stock() {
            return Err(malformed(TransactionRule::FlowNotStock(source.id())));
        }
        for split in transaction.splits() {
            self.check_split(split)?;
        }

        let sum = transaction.flow_sum();
        if !sum.is_zero() {
            return Err(malformed(TransactionRule::ConservationOfMoney(sum)));
        }

        for split in transaction.splits() {
            match split.path() {
                SplitPath::External { exit_point, .. } => {
                    if exit_point.tree() != source.tree() {
                        return Err(malformed(TransactionRule::ForeignExitPoint(*exit_point)));
                    }
                }
                SplitPath::Internal => {
                    if split.target().account().tree() != source.tree() {
                        return Err(malformed(TransactionRule::ForeignInternalTarget(
                            split.target().account(),
                        )));
                    }
                }
            }
        }

        for id in transaction.accounts() {
            if self.known_account(id)?.is_placeholder() {
                return Err(malformed(TransactionRule::PlaceholderAccount(id)));
            }
        }
        Ok(())
    }

    fn check_split(&self, split: &Split) -> Result<()> {
        let target = self.known_account(split.target().account())?;
        if !target.is_stock() {
            return Err(malformed(TransactionRule::TargetNotStock(target.id())));
        }
        if let SplitPath::External {
            exit_point,
            entry_point,
        } = *split.path()
        {
            if !self.known_account(exit_point)?.is_flux() {
                return Err(malformed(TransactionRule::ExitPointNotFlux(exit_point)));
            }
            let entry = self.known_account(entry_point)?;
            if !entry.is_flux() {
                return Err(malformed(TransactionRule::EntryPointNotFlux(entry_point)));
            }
            if entry.tree() != target.tree() {
                return Err(malformed(TransactionRule::EntryPointTargetMismatch {
                    entry_point,
                    target: target.id(),
                }));
            }
        }
        Ok(())
    }

    fn known_account(&self, id: AccountId) -> Result<&Account> {
        self.account(id)
            .map_err(|_| malformed(TransactionRule::UnknownAccount(id)))
    }
}
