//! wxpay CLI: sign frames, query and refund orders, replay callbacks.
//!
//! Subcommands: init, sign, query, close, refund, notify.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wxpay_core::config::LoggingConfig;
use wxpay_core::PayConfig;

/// wxpay merchant API client.
#[derive(Parser, Debug)]
#[command(name = "wxpay", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "wxpay.toml")]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file.
    Init(commands::init::InitArgs),
    /// Sign key=value pairs and print the request frame.
    Sign(commands::sign::SignArgs),
    /// Query an order.
    Query(commands::query::QueryArgs),
    /// Close an unpaid order.
    Close(commands::close::CloseArgs),
    /// Refund a paid order.
    Refund(commands::refund::RefundArgs),
    /// Process a saved payment callback against a local ledger.
    Notify(commands::notify::NotifyArgs),
}

fn init_tracing(logging: &LoggingConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = PayConfig::load(&cli.config)?;
    init_tracing(&config.logging, cli.log_level.as_deref());

    match &cli.command {
        Commands::Init(args) => commands::init::run(args, &cli.config),
        Commands::Sign(args) => commands::sign::run(args, &config),
        Commands::Query(args) => commands::query::run(args, config),
        Commands::Close(args) => commands::close::run(args, config),
        Commands::Refund(args) => commands::refund::run(args, config),
        Commands::Notify(args) => commands::notify::run(args, config),
    }
}
