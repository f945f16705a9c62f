//! accounting-engine CLI
//!
//! Replay accounting journals and inspect the resulting books.
//!
//! # Usage
//!
//! ```bash
//! # Replay a journal and print balances
//! accounting-engine replay --input journal.json
//!
//! # Output as JSON, with a custom configuration
//! accounting-engine replay --input journal.json --format json --config accounting.json
//!
//! # Generate a random journal for testing
//! accounting-engine generate --subjects 10 --transactions 100
//! ```

use accounting_engine::config::EngineConfig;
use accounting_engine::engine::Books;
use accounting_engine::journal::Journal;
use accounting_engine::simulation::workload::{generate_workload, WorkloadConfig};
use rust_decimal::Decimal;
use std::fs;
use std::process;

fn print_usage() {
    eprintln!(
        r#"accounting-engine: double-entry bookkeeping for economic subjects

USAGE:
    accounting-engine <COMMAND> [OPTIONS]

COMMANDS:
    replay      Replay a journal and report balances
    generate    Generate a random journal (for testing)
    help        Show this message

OPTIONS (replay):
    --input <FILE>      Path to JSON journal file
    --format <FORMAT>   Output format: text (default) or json
    --config <FILE>     Path to JSON engine configuration

OPTIONS (generate):
    --subjects <N>      Number of subjects (default: 10)
    --transactions <N>  Number of transactions (default: 100)
    --output <FILE>     Write to file instead of stdout

ENVIRONMENT:
    RUST_LOG            Log level (default: warn)

EXAMPLES:
    accounting-engine replay --input journal.json
    accounting-engine replay --input journal.json --format json
    accounting-engine generate --subjects 20 --transactions 500 --output journal.json"#
    );
}

/// JSON output schema for a replay.
#[derive(serde::Serialize)]
struct ReplayOutput {
    transactions: usize,
    ledger_entries: usize,
    subjects: Vec<SubjectOutput>,
}

#[derive(serde::Serialize)]
struct SubjectOutput {
    owner: String,
    total_amount: String,
    accounts: Vec<AccountOutput>,
}

#[derive(serde::Serialize)]
struct AccountOutput {
    path: String,
    kind: String,
    balance: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "Unknown format: {} (expected 'text' or 'json')",
                other
            )),
        }
    }
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    process::exit(1);
}

fn option_value(args: &[String], i: usize, message: &str) -> String {
    args.get(i).cloned().unwrap_or_else(|| fail(message.to_string()))
}

fn load_journal(path: &str) -> Journal {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| fail(format!("Error reading file '{}': {}", path, e)));
    Journal::from_json_str(&content).unwrap_or_else(|e| {
        eprintln!("Error parsing journal: {}", e);
        eprintln!("Expected format:");
        eprintln!(
            r#"{{
  "subjects": [
    {{ "owner": "person:alice", "accounts": [{{ "name": "wallet", "kind": "ASSET" }}] }}
  ],
  "transactions": [
    {{ "type": "simple",
      "source": {{ "owner": "person:alice", "path": "/wallet" }},
      "target": {{ "owner": "person:alice", "path": "/savings" }},
      "amount": "10.50", "description": "save", "issuer": "person:alice" }}
  ]
}}"#
        );
        process::exit(1);
    })
}

fn report(books: &Books) -> ReplayOutput {
    let subjects = books
        .trees()
        .into_iter()
        .map(|tree| SubjectOutput {
            owner: tree.owner().to_string(),
            total_amount: tree.total_amount(books.ledger()).to_string(),
            accounts: tree
                .accounts()
                .filter(|account| !account.is_root())
                .map(|account| AccountOutput {
                    path: account.path().to_string(),
                    kind: account.kind().to_string(),
                    balance: books.balance(account.id()).to_string(),
                })
                .collect(),
        })
        .collect();
    ReplayOutput {
        transactions: books.transactions().len(),
        ledger_entries: books.ledger().len(),
        subjects,
    }
}

fn cmd_replay(args: &[String]) {
    let mut input_path = None;
    let mut config_path = None;
    let mut format = OutputFormat::Text;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--input" => {
                i += 1;
                input_path = Some(option_value(args, i, "--input requires a file path"));
            }
            "--config" => {
                i += 1;
                config_path = Some(option_value(args, i, "--config requires a file path"));
            }
            "--format" => {
                i += 1;
                format = option_value(args, i, "--format requires 'text' or 'json'")
                    .parse()
                    .unwrap_or_else(|e| fail(e));
            }
            _ => fail(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    let path = input_path.unwrap_or_else(|| fail("Error: --input <FILE> is required".to_string()));
    let config = match config_path {
        Some(config_path) => EngineConfig::from_file(&config_path)
            .unwrap_or_else(|e| fail(format!("Error loading configuration: {}", e))),
        None => EngineConfig::default(),
    };

    let journal = load_journal(&path);
    let mut books = Books::with_config(config)
        .unwrap_or_else(|e| fail(format!("Error loading configuration: {}", e)));
    if let Err(e) = journal.replay(&mut books) {
        fail(format!("Error replaying journal: {}", e));
    }

    let output = report(&books);
    if format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&output)
            .unwrap_or_else(|e| fail(format!("Error serializing report: {}", e)));
        println!("{}", json);
        return;
    }

    let mut community_total = Decimal::ZERO;
    for tree in books.trees() {
        let total = tree.total_amount(books.ledger());
        community_total += total;
        println!("{}  (total: {})", tree.owner(), total);
        for account in tree.accounts().filter(|a| !a.is_root()) {
            println!(
                "    {:<32} {:<20} {:>14}",
                account.path(),
                account.kind().to_string(),
                books.balance(account.id())
            );
        }
    }
    println!();
    println!("Transactions:    {}", output.transactions);
    println!("Ledger entries:  {}", output.ledger_entries);
    println!("Community total: {}", community_total);
}

fn cmd_generate(args: &[String]) {
    let mut config = WorkloadConfig::default();
    let mut output_path: Option<String> = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--subjects" => {
                i += 1;
                config.subject_count = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| fail("--subjects requires a number".to_string()));
            }
            "--transactions" => {
                i += 1;
                config.transaction_count = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(|| fail("--transactions requires a number".to_string()));
            }
            "--output" => {
                i += 1;
                output_path = Some(option_value(args, i, "--output requires a file path"));
            }
            _ => fail(format!("Unknown option: {}", args[i])),
        }
        i += 1;
    }

    let journal = generate_workload(&config);
    let json = journal
        .to_json_pretty()
        .unwrap_or_else(|e| fail(format!("Error serializing journal: {}", e)));

    if let Some(path) = output_path {
        fs::write(&path, &json)
            .unwrap_or_else(|e| fail(format!("Error writing to '{}': {}", path, e)));
        eprintln!(
            "Generated {} transactions across {} subjects -> {}",
            journal.transactions.len(),
            journal.subjects.len(),
            path
        );
    } else {
        println!("{}", json);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let command = args[1].as_str();
    let rest = &args[2..];

    match command {
        "replay" => cmd_replay(rest),
        "generate" => cmd_generate(rest),
        "help" | "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            process::exit(1);
        }
    }
}
