#![forbid(unsafe_code)]
//! Interactive operator console for the interbank ledger

use clap::Parser;
use colored::*;
use interbank_ledger::cli::{run_interactive, LedgerCli};
use interbank_ledger::config::{load_config_from, DEFAULT_CONFIG_PATH};
use std::io;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    /// Override the audit database path from the configuration
    #[arg(long)]
    db: Option<String>,
    /// Keep the audit log in memory only
    #[arg(long)]
    ephemeral: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let mut config = load_config_from(&args.config)?;
    if let Some(db) = args.db {
        config.database.path = db;
    }
    config.validate()?;

    tracing_subscriber::fmt()
        .with_max_level(config.logging.max_level()?)
        .init();
    info!("Starting interbank ledger (genesis proof = {})", config.ledger.genesis_proof);

    let mut cli = LedgerCli::from_config(&config, args.ephemeral);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    run_interactive(&mut cli, &mut input, &mut output)?;

    if !cli.ledger().validate() {
        eprintln!("{}", "Warning: ledger failed validation at exit".yellow());
    }
    Ok(())
}
