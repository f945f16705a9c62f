//! Random accounting workloads.
//!
//! Generates journals of subjects, accounts and valid transactions mixing
//! all four posting patterns. Used by the benchmarks and the `generate`
//! command.

use crate::core::entity::OwnerId;
use crate::journal::{
    AccountEntry, Address, FlowEntry, Journal, Posting, SplitEntry, SubjectEntry,
    TransactionEntry,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Configuration for generating a random journal.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    /// Number of subjects, each with its own account tree.
    pub subject_count: usize,
    /// Asset accounts created under each root (at least 2 are used).
    pub accounts_per_subject: usize,
    /// Number of transactions to generate.
    pub transaction_count: usize,
    /// Minimum amount of a single flow.
    pub min_amount: Decimal,
    /// Maximum amount of a single flow.
    pub max_amount: Decimal,
    /// Seed for reproducible workloads; `None` draws from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            subject_count: 10,
            accounts_per_subject: 3,
            transaction_count: 100,
            min_amount: Decimal::ONE,
            max_amount: Decimal::from(1_000),
            seed: None,
        }
    }
}

struct Generator {
    rng: StdRng,
    owners: Vec<OwnerId>,
    accounts: usize,
    min_cents: i64,
    max_cents: i64,
}

impl Generator {
    fn new(config: &WorkloadConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let to_cents = |amount: Decimal| (amount * Decimal::from(100)).trunc().to_i64();
        let min_cents = to_cents(config.min_amount).unwrap_or(1).max(1);
        let max_cents = to_cents(config.max_amount).unwrap_or(min_cents).max(min_cents);
        Self {
            rng,
            owners: (0..config.subject_count.max(1))
                .map(|i| OwnerId::new("subject", format!("S-{:03}", i)))
                .collect(),
            accounts: config.accounts_per_subject.max(2),
            min_cents,
            max_cents,
        }
    }

    fn amount(&mut self) -> Decimal {
        Decimal::new(self.rng.gen_range(self.min_cents..=self.max_cents), 2)
    }

    fn owner(&mut self) -> usize {
        self.rng.gen_range(0..self.owners.len())
    }

    /// A subject other than `owner`, when there is one.
    fn other_owner(&mut self, owner: usize) -> Option<usize> {
        if self.owners.len() < 2 {
            return None;
        }
        let other = self.rng.gen_range(0..self.owners.len() - 1);
        Some(if other >= owner { other + 1 } else { other })
    }

    fn asset(&mut self, owner: usize) -> Address {
        let index = self.rng.gen_range(0..self.accounts);
        Address::new(self.owners[owner].clone(), asset_path(index))
    }

    /// Two distinct asset accounts of `owner`.
    fn asset_pair(&mut self, owner: usize) -> (Address, Address) {
        let first = self.rng.gen_range(0..self.accounts);
        let second = (first + self.rng.gen_range(1..self.accounts)) % self.accounts;
        let owner = &self.owners[owner];
        (
            Address::new(owner.clone(), asset_path(first)),
            Address::new(owner.clone(), asset_path(second)),
        )
    }

    fn flux(&self, owner: usize, name: &str) -> Address {
        Address::new(self.owners[owner].clone(), format!("/{}", name))
    }

    fn simple(&mut self, owner: usize) -> Posting {
        let (source, target) = self.asset_pair(owner);
        Posting::Simple {
            source,
            target,
            amount: self.amount(),
        }
    }

    fn internal(&mut self, owner: usize) -> Posting {
        let count = self.rng.gen_range(2..=3);
        let source = self.asset(owner);
        let mut total = Decimal::ZERO;
        let mut targets = Vec::with_capacity(count);
        for _ in 0..count {
            let amount = self.amount();
            total += amount;
            targets.push(FlowEntry {
                account: self.asset(owner),
                amount: -amount,
            });
        }
        Posting::Internal {
            source: FlowEntry {
                account: source,
                amount: total,
            },
            targets,
        }
    }

    fn external(&mut self, owner: usize, other: usize) -> Posting {
        Posting::External {
            source: self.asset(owner),
            exit_point: self.flux(owner, "expenses"),
            entry_point: self.flux(other, "incomes"),
            target: self.asset(other),
            amount: self.amount(),
        }
    }

    fn split(&mut self, owner: usize, other: usize) -> Posting {
        let kept = self.amount();
        let paid = self.amount();
        let internal = SplitEntry::Internal {
            target: FlowEntry {
                account: self.asset(owner),
                amount: -kept,
            },
            description: "kept".to_string(),
        };
        let external = SplitEntry::External {
            exit_point: self.flux(owner, "expenses"),
            entry_point: self.flux(other, "incomes"),
            target: FlowEntry {
                account: self.asset(other),
                amount: -paid,
            },
            description: "paid".to_string(),
        };
        Posting::Split {
            source: FlowEntry {
                account: self.asset(owner),
                amount: kept + paid,
            },
            splits: vec![internal, external],
        }
    }

    fn transaction(&mut self, n: usize) -> TransactionEntry {
        let owner = self.owner();
        let (posting, label) = match (self.rng.gen_range(0..4), self.other_owner(owner)) {
            (1, _) => (self.internal(owner), "internal transfer"),
            (2, Some(other)) => (self.external(owner, other), "payment"),
            (3, Some(other)) => (self.split(owner, other), "split payment"),
            _ => (self.simple(owner), "transfer"),
        };
        TransactionEntry::new(
            posting,
            format!("{} #{}", label, n + 1),
            self.owners[owner].clone(),
        )
    }
}

fn asset_path(index: usize) -> String {
    format!("/account-{:02}", index)
}

/// Generate a random, valid journal.
pub fn generate_workload(config: &WorkloadConfig) -> Journal {
    let mut generator = Generator::new(config);

    let subjects = generator
        .owners
        .iter()
        .map(|owner| SubjectEntry {
            owner: owner.clone(),
            accounts: (0..generator.accounts)
                .map(|index| AccountEntry {
                    parent: "/".to_string(),
                    name: asset_path(index)[1..].to_string(),
                    kind: "ASSET".to_string(),
                    placeholder: false,
                })
                .collect(),
        })
        .collect();

    let transactions = (0..config.transaction_count)
        .map(|n| generator.transaction(n))
        .collect();

    Journal {
        account_kinds: Vec::new(),
        subjects,
        transactions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Books;

    #[test]
    fn test_workload_generation() {
        let config = WorkloadConfig {
            subject_count: 4,
            accounts_per_subject: 3,
            transaction_count: 50,
            seed: Some(7),
            ..Default::default()
        };
        let journal = generate_workload(&config);
        assert_eq!(journal.subjects.len(), 4);
        assert_eq!(journal.transactions.len(), 50);
        assert!(journal.subjects.iter().all(|s| s.accounts.len() == 3));
    }

    #[test]
    fn test_seeded_workloads_are_reproducible() {
        let config = WorkloadConfig {
            seed: Some(42),
            transaction_count: 20,
            ..Default::default()
        };
        assert_eq!(generate_workload(&config), generate_workload(&config));
    }

    #[test]
    fn test_generated_workload_replays() {
        let config = WorkloadConfig {
            subject_count: 5,
            transaction_count: 200,
            seed: Some(3),
            ..Default::default()
        };
        let journal = generate_workload(&config);
        let mut books = Books::new();
        let ids = journal.replay(&mut books).unwrap();
        assert_eq!(ids.len(), 200);

        // Money only moves between trees, so the community total is zero.
        let total: Decimal = journal
            .subjects
            .iter()
            .map(|s| books.total_amount(&s.owner).unwrap())
            .sum();
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn test_single_subject_workload() {
        let config = WorkloadConfig {
            subject_count: 1,
            accounts_per_subject: 2,
            transaction_count: 30,
            seed: Some(11),
            ..Default::default()
        };
        let journal = generate_workload(&config);
        let mut books = Books::new();
        assert!(journal.replay(&mut books).is_ok());
    }
}
