//! Operator-facing driver: wraps one [`Ledger`] and mirrors every successful
//! operation into the audit store.
//!
//! Each operation logs its own failure and returns, so a bad input never
//! ends the interactive session.

use crate::blockchain::{Block, Ledger};
use crate::config::{Config, LedgerConfig};
use crate::error::ChainError;
use crate::persistence::{
    BlockRecord, Database, InMemoryPersistence, Persistence, StoredBlock, StoredTransfer,
};
use chrono::{TimeZone, Utc};
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Table};
use std::io::{BufRead, Write};
use tracing::{error, info, warn};

pub struct LedgerCli {
    ledger: Ledger,
    store: Box<dyn Persistence>,
    settings: LedgerConfig,
}

impl LedgerCli {
    pub fn new(settings: LedgerConfig, store: Box<dyn Persistence>) -> Self {
        Self {
            ledger: Ledger::with_genesis_proof(settings.genesis_proof),
            store,
            settings,
        }
    }

    /// Build a driver from configuration, falling back to an in-memory
    /// audit store when `ephemeral` is set or the database cannot be opened.
    pub fn from_config(config: &Config, ephemeral: bool) -> Self {
        let store: Box<dyn Persistence> = if ephemeral {
            info!("Using in-memory audit store");
            Box::new(InMemoryPersistence::new())
        } else {
            match Database::open(&config.database.path) {
                Ok(db) => {
                    info!("Audit store at {}", config.database.path);
                    Box::new(db)
                }
                Err(e) => {
                    warn!(
                        "Failed to open DB at {}: {}. Falling back to in-memory persistence.",
                        config.database.path, e
                    );
                    Box::new(InMemoryPersistence::new())
                }
            }
        };

        Self::new(config.ledger.clone(), store)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn store(&self) -> &dyn Persistence {
        self.store.as_ref()
    }

    /// Queue a transfer and mirror it into the audit store.
    ///
    /// Returns the number of the block that will hold it, or `None` if the
    /// transfer was rejected.
    pub fn add_transaction(&mut self, sender: &str, receiver: &str, amount: f64) -> Option<u64> {
        match self.ledger.submit(sender, receiver, amount) {
            Ok(next_block) => {
                if let Some(record) = self.ledger.pending().last() {
                    if let Err(e) = self.store.record_transfer(record) {
                        warn!("Transaction kept in ledger but not recorded in audit store: {}", e);
                    }
                }
                info!(
                    "Transaction added successfully. Will be included in block {}",
                    next_block
                );
                Some(next_block)
            }
            Err(e) => {
                error!("Error adding transaction: {}", e);
                None
            }
        }
    }

    /// Seal pending transfers with `proof`, or the configured default proof.
    pub fn generate_block(&mut self, proof: Option<u64>) -> Option<Block> {
        match self.seal_and_record(proof.unwrap_or(self.settings.block_proof)) {
            Ok(block) => {
                info!(
                    "New block generated: {} ({} transfers)",
                    block.sequence_number,
                    block.transfers.len()
                );
                Some(block)
            }
            Err(e) => {
                error!("Error generating block: {}", e);
                None
            }
        }
    }

    fn seal_and_record(&mut self, proof: u64) -> Result<Block, ChainError> {
        let previous_hash = self.ledger.last_block()?.hash();
        let block = self.ledger.seal(proof, Some(previous_hash))?;

        if let Err(e) = self.store.record_block(&BlockRecord::from_block(&block)) {
            warn!(
                "Block {} kept in ledger but not recorded in audit store: {}",
                block.sequence_number, e
            );
        }
        Ok(block)
    }

    /// Render every block and its transfers as a table.
    pub fn view_chain(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_header(vec![
                Cell::new("Block"),
                Cell::new("Sealed"),
                Cell::new("Previous Hash"),
                Cell::new("Proof"),
                Cell::new("Transfers"),
            ]);

        for block in self.ledger.chain() {
            let transfers = if block.transfers.is_empty() {
                "-".to_string()
            } else {
                block
                    .transfers
                    .iter()
                    .map(|t| format!("{} -> {}: {}", t.sender, t.receiver, t.amount))
                    .collect::<Vec<_>>()
                    .join("\n")
            };

            table.add_row(vec![
                Cell::new(format!("#{}", block.sequence_number)),
                Cell::new(format_timestamp(block.sealed_at)),
                Cell::new(&block.previous_hash),
                Cell::new(block.proof),
                Cell::new(transfers),
            ]);
        }

        format!(
            "=== Current Blockchain ({} blocks, {} pending) ===\n{}",
            self.ledger.len(),
            self.ledger.pending().len(),
            table
        )
    }

    /// Run a full validation pass and log the outcome.
    pub fn validate_chain(&self) -> bool {
        let faults = self.ledger.validation_report();
        if faults.is_empty() {
            info!("Blockchain is valid!");
            true
        } else {
            warn!("Blockchain validation failed!");
            for fault in &faults {
                warn!("{}", fault);
            }
            false
        }
    }

    /// Render the rows mirrored into the audit store.
    pub fn audit_log(&self) -> Option<String> {
        let (transfers, blocks) = match load_audit_rows(self.store.as_ref()) {
            Ok(rows) => rows,
            Err(e) => {
                error!("Error reading audit log: {}", e);
                return None;
            }
        };

        let mut transfer_table = Table::new();
        transfer_table
            .load_preset(UTF8_FULL)
            .set_header(vec!["ID", "Sender", "Receiver", "Amount", "Recorded"]);
        for t in &transfers {
            transfer_table.add_row(vec![
                Cell::new(t.id),
                Cell::new(&t.sender),
                Cell::new(&t.receiver),
                Cell::new(t.amount),
                Cell::new(format_timestamp(t.timestamp)),
            ]);
        }

        let mut block_table = Table::new();
        block_table
            .load_preset(UTF8_FULL)
            .set_header(vec!["ID", "Block Hash", "Previous Hash", "Proof", "Sealed"]);
        for b in &blocks {
            block_table.add_row(vec![
                Cell::new(b.id),
                Cell::new(&b.block_hash),
                Cell::new(&b.previous_hash),
                Cell::new(b.proof),
                Cell::new(format_timestamp(b.timestamp)),
            ]);
        }

        Some(format!(
            "=== Audited Transactions ({}) ===\n{}\n=== Audited Blocks ({}) ===\n{}",
            transfers.len(),
            transfer_table,
            blocks.len(),
            block_table
        ))
    }
}

fn load_audit_rows(store: &dyn Persistence) -> Result<(Vec<StoredTransfer>, Vec<StoredBlock>), ChainError> {
    Ok((store.load_transfers()?, store.load_blocks()?))
}

fn format_timestamp(millis: u64) -> String {
    match Utc.timestamp_millis_opt(millis as i64).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
        None => millis.to_string(),
    }
}

pub fn print_menu<W: Write>(out: &mut W) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "Interbank Blockchain System".bright_cyan().bold())?;
    writeln!(out, "1. Add Transaction")?;
    writeln!(out, "2. Generate Block")?;
    writeln!(out, "3. View Blockchain")?;
    writeln!(out, "4. Validate Chain")?;
    writeln!(out, "5. Audit Log")?;
    writeln!(out, "6. Exit")?;
    writeln!(out)?;
    write!(out, "Enter your choice (1-6): ")?;
    out.flush()
}

/// Print `label` and read one trimmed line; `None` on end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> std::io::Result<Option<String>> {
    write!(out, "{}", label)?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Drive the interactive menu until the operator exits or input ends.
pub fn run_interactive<R: BufRead, W: Write>(
    cli: &mut LedgerCli,
    input: &mut R,
    out: &mut W,
) -> std::io::Result<()> {
    loop {
        print_menu(out)?;
        let choice = match prompt(input, out, "")? {
            Some(choice) => choice,
            None => break,
        };

        match choice.as_str() {
            "1" => {
                let Some(sender) = prompt(input, out, "Enter sender bank: ")? else { break };
                let Some(receiver) = prompt(input, out, "Enter receiver bank: ")? else { break };
                let Some(amount) = prompt(input, out, "Enter amount: ")? else { break };
                match amount.parse::<f64>() {
                    Ok(amount) => {
                        cli.add_transaction(&sender, &receiver, amount);
                    }
                    Err(_) => error!("Invalid amount entered"),
                }
            }
            "2" => {
                let Some(proof) = prompt(input, out, "Enter proof (blank for default): ")? else { break };
                if proof.is_empty() {
                    cli.generate_block(None);
                } else {
                    match proof.parse::<u64>() {
                        Ok(proof) => {
                            cli.generate_block(Some(proof));
                        }
                        Err(_) => error!("Invalid proof entered"),
                    }
                }
            }
            "3" => writeln!(out, "{}", cli.view_chain())?,
            "4" => {
                cli.validate_chain();
            }
            "5" => {
                if let Some(log) = cli.audit_log() {
                    writeln!(out, "{}", log)?;
                }
            }
            "6" => {
                writeln!(out, "{}", "Goodbye!".green())?;
                return Ok(());
            }
            _ => writeln!(out, "{}", "Invalid choice. Please try again.".yellow())?,
        }
    }

    writeln!(out)?;
    writeln!(out, "Exiting gracefully...")?;
    Ok(())
}
