//! Integration tests for the interactive driver and the SQLite audit store

use interbank_ledger::cli::{run_interactive, LedgerCli};
use interbank_ledger::config::{parse_config, Config};
use interbank_ledger::persistence::Database;
use std::io::Cursor;
use tempfile::TempDir;

/// Helper to run a scripted session and capture its output
fn run_script(cli: &mut LedgerCli, script: &str) -> Result<String, Box<dyn std::error::Error>> {
    let mut input = Cursor::new(script.as_bytes().to_vec());
    let mut output = Vec::new();
    run_interactive(cli, &mut input, &mut output)?;
    Ok(String::from_utf8(output)?)
}

fn ephemeral_cli() -> LedgerCli {
    LedgerCli::from_config(&Config::default(), true)
}

#[test]
fn test_session_adds_seals_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let mut cli = ephemeral_cli();
    let output = run_script(
        &mut cli,
        "1\nBankA\nBankB\n100\n2\n35293\n4\n3\n6\n",
    )?;

    assert!(output.contains("Interbank Blockchain System"));
    assert!(output.contains("BankA -> BankB: 100"));
    assert!(output.contains("Goodbye!"));

    assert_eq!(cli.ledger().len(), 2);
    assert!(cli.ledger().pending().is_empty());
    assert!(cli.ledger().validate());
    assert_eq!(cli.store().load_transfers()?.len(), 1);
    assert_eq!(cli.store().load_blocks()?.len(), 1);
    Ok(())
}

#[test]
fn test_bad_input_does_not_end_session() -> Result<(), Box<dyn std::error::Error>> {
    let mut cli = ephemeral_cli();
    let output = run_script(
        &mut cli,
        "1\nBankA\nBankB\nlots\n1\nBankA\nBankB\n-5\n9\n2\nabc\n1\nBankA\nBankB\n10\n6\n",
    )?;

    assert!(output.contains("Invalid choice. Please try again."));
    assert!(output.contains("Goodbye!"));
    assert_eq!(cli.ledger().pending().len(), 1);
    assert_eq!(cli.ledger().len(), 1);
    Ok(())
}

#[test]
fn test_end_of_input_exits_gracefully() -> Result<(), Box<dyn std::error::Error>> {
    let mut cli = ephemeral_cli();
    let output = run_script(&mut cli, "1\nBankA\n")?;

    assert!(output.contains("Exiting gracefully..."));
    assert!(cli.ledger().pending().is_empty());
    Ok(())
}

#[test]
fn test_default_proof_seals_an_invalid_pairing() -> Result<(), Box<dyn std::error::Error>> {
    let mut cli = ephemeral_cli();
    run_script(&mut cli, "2\n\n6\n")?;

    // the default proof (100) does not pair with the genesis proof (100)
    assert_eq!(cli.ledger().len(), 2);
    assert_eq!(cli.ledger().chain()[1].proof, 100);
    assert!(!cli.ledger().validate());
    Ok(())
}

#[test]
fn test_audit_log_on_disk() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("nested").join("transactions.db");
    let config = parse_config(&format!(
        "[database]\npath = {:?}\n[ledger]\nblock_proof = 35293\n",
        db_path.to_string_lossy()
    ))?;

    let mut cli = LedgerCli::from_config(&config, false);
    let output = run_script(&mut cli, "1\nBankA\nBankB\n42.5\n2\n\n5\n6\n")?;
    assert!(output.contains("Audited Transactions (1)"));
    assert!(output.contains("Audited Blocks (1)"));
    drop(cli);

    assert!(db_path.exists());
    let db = Database::open(&db_path.to_string_lossy())?;
    let transfers = db.load_transfers()?;
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].amount, 42.5);

    let blocks = db.load_blocks()?;
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].proof, 35293);
    assert_eq!(blocks[0].block_hash.len(), 64);
    Ok(())
}
