//! `wxpay notify`: Replay a saved payment callback against a ledger file.
//!
//! The ledger is a JSON array of bills. Settled bills are written back to
//! the same file so repeated runs show the duplicate-delivery path.

use anyhow::Context;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use wxpay_client::PayClient;
use wxpay_core::PayConfig;
use wxpay_notify::{Bill, InMemoryLedger, NotificationOutcome, NotificationProcessor};

#[derive(Args, Debug)]
pub struct NotifyArgs {
    /// File holding the raw callback body.
    pub callback: PathBuf,

    /// JSON file with the merchant's bills.
    #[arg(long, default_value = "bills.json")]
    pub bills: PathBuf,

    /// Leave the bills file untouched.
    #[arg(long)]
    pub dry_run: bool,
}

fn load_bills(path: &PathBuf) -> anyhow::Result<Vec<Bill>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading bills from {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

pub fn run(args: &NotifyArgs, config: PayConfig) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.callback)
        .with_context(|| format!("reading callback from {}", args.callback.display()))?;
    let ledger = Arc::new(InMemoryLedger::with_bills(load_bills(&args.bills)?));
    let client = Arc::new(PayClient::new(config)?);

    let processor = NotificationProcessor::new(client, ledger.clone());
    let result = processor.process(&raw)?;

    match &result.outcome {
        NotificationOutcome::Accepted(state) => println!("Accepted (trade state {state})"),
        NotificationOutcome::Rejected(reason) => println!("Rejected: {reason}"),
    }
    println!("  final state: {}", result.state);
    println!("  settled:     {}", result.settled);
    println!("Reply:");
    println!("{}", result.reply);

    if result.settled && !args.dry_run {
        let bills = ledger.bills();
        std::fs::write(&args.bills, serde_json::to_string_pretty(&bills)?)?;
        tracing::info!(path = %args.bills.display(), "ledger updated");
    }
    Ok(())
}
