use accounting_engine::engine::Books;
use accounting_engine::simulation::workload::{generate_workload, WorkloadConfig};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

fn bench_replay(c: &mut Criterion, name: &str, subjects: usize, transactions: usize) {
    let config = WorkloadConfig {
        subject_count: subjects,
        transaction_count: transactions,
        seed: Some(1),
        ..Default::default()
    };
    let journal = generate_workload(&config);

    c.bench_function(name, |b| {
        b.iter_batched(
            Books::new,
            |mut books| {
                journal.replay(&mut books).ok();
                black_box(books)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_replay_10_subjects(c: &mut Criterion) {
    bench_replay(c, "replay_10_subjects_100_transactions", 10, 100);
}

fn bench_replay_100_subjects(c: &mut Criterion) {
    bench_replay(c, "replay_100_subjects_1000_transactions", 100, 1_000);
}

fn bench_balance_lookup(c: &mut Criterion) {
    let config = WorkloadConfig {
        subject_count: 50,
        transaction_count: 5_000,
        seed: Some(2),
        ..Default::default()
    };
    let journal = generate_workload(&config);
    let mut books = Books::new();
    journal.replay(&mut books).ok();

    c.bench_function("total_amount_50_subjects", |b| {
        b.iter(|| {
            for subject in &journal.subjects {
                black_box(books.total_amount(black_box(&subject.owner)).ok());
            }
        })
    });
}

criterion_group!(
    benches,
    bench_replay_10_subjects,
    bench_replay_100_subjects,
    bench_balance_lookup
);
criterion_main!(benches);
