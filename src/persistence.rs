//! Audit store for the interbank ledger
//!
//! The store mirrors what the ledger did (each submitted transfer, each
//! sealed block's hash and proof). It is written after the in-memory
//! operation succeeds and is never read back into the ledger, so a failed
//! write here cannot corrupt ledger state.

use crate::blockchain::Block;
use crate::error::ChainError;
use crate::transaction::{Timestamp, TransferRecord};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Row written when a block is sealed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlockRecord {
    pub block_hash: String,
    pub previous_hash: String,
    pub proof: u64,
    pub timestamp: Timestamp,
}

impl BlockRecord {
    pub fn from_block(block: &Block) -> Self {
        Self {
            block_hash: block.hash(),
            previous_hash: block.previous_hash.clone(),
            proof: block.proof,
            timestamp: block.sealed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoredTransfer {
    pub id: i64,
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoredBlock {
    pub id: i64,
    pub block_hash: String,
    pub previous_hash: String,
    pub proof: u64,
    pub timestamp: Timestamp,
}

/// Abstraction for audit backends. Each `record_*` call returns the id of
/// the inserted row; ids start at 1 and increase in insertion order.
pub trait Persistence: Send + Sync {
    fn record_transfer(&self, transfer: &TransferRecord) -> Result<i64, ChainError>;
    fn record_block(&self, block: &BlockRecord) -> Result<i64, ChainError>;
    fn load_transfers(&self) -> Result<Vec<StoredTransfer>, ChainError>;
    fn load_blocks(&self) -> Result<Vec<StoredBlock>, ChainError>;
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the SQLite audit database at `path`.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open(path: &str) -> Result<Self, ChainError> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        ChainError::DatabaseError(format!(
                            "Failed to create data dir {:?}: {}",
                            parent, e
                        ))
                    })?;
                }
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| ChainError::DatabaseError(format!("Failed to open database: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sender TEXT NOT NULL,
                receiver TEXT NOT NULL,
                amount REAL NOT NULL,
                timestamp INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            ChainError::DatabaseError(format!("Failed to create transactions table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS blocks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                block_hash TEXT NOT NULL,
                previous_hash TEXT,
                proof INTEGER NOT NULL,
                timestamp INTEGER NOT NULL
            )",
            [],
        )
        .map_err(|e| ChainError::DatabaseError(format!("Failed to create blocks table: {}", e)))?;

        Ok(Database { conn: Mutex::new(conn) })
    }

    pub fn record_transfer(&self, transfer: &TransferRecord) -> Result<i64, ChainError> {
        let conn = self.conn.lock().map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO transactions (sender, receiver, amount, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                transfer.sender,
                transfer.receiver,
                transfer.amount,
                transfer.recorded_at as i64,
            ],
        )
        .map_err(|e| ChainError::DatabaseError(format!("Failed to save transaction: {}", e)))?;

        Ok(conn.last_insert_rowid())
    }

    pub fn record_block(&self, block: &BlockRecord) -> Result<i64, ChainError> {
        let conn = self.conn.lock().map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO blocks (block_hash, previous_hash, proof, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                block.block_hash,
                block.previous_hash,
                block.proof as i64,
                block.timestamp as i64,
            ],
        )
        .map_err(|e| ChainError::DatabaseError(format!("Failed to save block: {}", e)))?;

        Ok(conn.last_insert_rowid())
    }

    pub fn load_transfers(&self) -> Result<Vec<StoredTransfer>, ChainError> {
        let conn = self.conn.lock().map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        let mut stmt = conn
            .prepare("SELECT id, sender, receiver, amount, timestamp FROM transactions ORDER BY id ASC")
            .map_err(|e| ChainError::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let timestamp: i64 = row.get(4)?;
                Ok(StoredTransfer {
                    id: row.get(0)?,
                    sender: row.get(1)?,
                    receiver: row.get(2)?,
                    amount: row.get(3)?,
                    timestamp: timestamp as Timestamp,
                })
            })
            .map_err(|e| ChainError::DatabaseError(format!("Failed to query transactions: {}", e)))?;

        let mut transfers = Vec::new();
        for row in rows {
            transfers.push(
                row.map_err(|e| ChainError::DatabaseError(format!("Failed to read row: {}", e)))?,
            );
        }
        Ok(transfers)
    }

    pub fn load_blocks(&self) -> Result<Vec<StoredBlock>, ChainError> {
        let conn = self.conn.lock().map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        let mut stmt = conn
            .prepare("SELECT id, block_hash, previous_hash, proof, timestamp FROM blocks ORDER BY id ASC")
            .map_err(|e| ChainError::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let previous_hash: Option<String> = row.get(2)?;
                let proof: i64 = row.get(3)?;
                let timestamp: i64 = row.get(4)?;
                Ok(StoredBlock {
                    id: row.get(0)?,
                    block_hash: row.get(1)?,
                    previous_hash: previous_hash.unwrap_or_default(),
                    proof: proof as u64,
                    timestamp: timestamp as Timestamp,
                })
            })
            .map_err(|e| ChainError::DatabaseError(format!("Failed to query blocks: {}", e)))?;

        let mut blocks = Vec::new();
        for row in rows {
            blocks.push(
                row.map_err(|e| ChainError::DatabaseError(format!("Failed to read row: {}", e)))?,
            );
        }
        Ok(blocks)
    }
}

// Implement the Persistence trait for the rusqlite-backed Database
impl Persistence for Database {
    fn record_transfer(&self, transfer: &TransferRecord) -> Result<i64, ChainError> {
        Database::record_transfer(self, transfer)
    }

    fn record_block(&self, block: &BlockRecord) -> Result<i64, ChainError> {
        Database::record_block(self, block)
    }

    fn load_transfers(&self) -> Result<Vec<StoredTransfer>, ChainError> {
        Database::load_transfers(self)
    }

    fn load_blocks(&self) -> Result<Vec<StoredBlock>, ChainError> {
        Database::load_blocks(self)
    }
}

/// Simple in-memory persistence implementation useful for tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct InMemoryPersistence {
    pub transfers: Arc<Mutex<Vec<StoredTransfer>>>,
    pub blocks: Arc<Mutex<Vec<StoredBlock>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for InMemoryPersistence {
    fn record_transfer(&self, transfer: &TransferRecord) -> Result<i64, ChainError> {
        let mut transfers = self.transfers.lock().map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        let id = transfers.len() as i64 + 1;
        transfers.push(StoredTransfer {
            id,
            sender: transfer.sender.clone(),
            receiver: transfer.receiver.clone(),
            amount: transfer.amount,
            timestamp: transfer.recorded_at,
        });
        Ok(id)
    }

    fn record_block(&self, block: &BlockRecord) -> Result<i64, ChainError> {
        let mut blocks = self.blocks.lock().map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        let id = blocks.len() as i64 + 1;
        blocks.push(StoredBlock {
            id,
            block_hash: block.block_hash.clone(),
            previous_hash: block.previous_hash.clone(),
            proof: block.proof,
            timestamp: block.timestamp,
        });
        Ok(id)
    }

    fn load_transfers(&self) -> Result<Vec<StoredTransfer>, ChainError> {
        let transfers = self.transfers.lock().map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        Ok(transfers.clone())
    }

    fn load_blocks(&self) -> Result<Vec<StoredBlock>, ChainError> {
        let blocks = self.blocks.lock().map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        Ok(blocks.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Ledger;

    fn sample_transfer() -> TransferRecord {
        TransferRecord::new("BankA", "BankB", 250.75, 1_700_000_000_123).unwrap()
    }

    #[test]
    fn test_database_open() {
        let db = Database::open(":memory:").unwrap();
        assert!(db.conn.lock().unwrap().is_autocommit());
        assert!(db.load_transfers().unwrap().is_empty());
        assert!(db.load_blocks().unwrap().is_empty());
    }

    #[test]
    fn test_database_records_transfers_in_order() {
        let db = Database::open(":memory:").unwrap();

        let first = db.record_transfer(&sample_transfer()).unwrap();
        let second = db
            .record_transfer(&TransferRecord::new("BankC", "BankD", 1.0, 5).unwrap())
            .unwrap();
        assert_eq!((first, second), (1, 2));

        let stored = db.load_transfers().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].sender, "BankA");
        assert_eq!(stored[0].receiver, "BankB");
        assert_eq!(stored[0].amount, 250.75);
        assert_eq!(stored[0].timestamp, 1_700_000_000_123);
        assert_eq!(stored[1].sender, "BankC");
    }

    #[test]
    fn test_database_records_block_metadata() {
        let db = Database::open(":memory:").unwrap();
        let ledger = Ledger::new();
        let genesis = ledger.last_block().unwrap();

        let record = BlockRecord::from_block(genesis);
        assert_eq!(db.record_block(&record).unwrap(), 1);

        let stored = db.load_blocks().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].block_hash, genesis.hash());
        assert_eq!(stored[0].previous_hash, "0");
        assert_eq!(stored[0].proof, 100);
        assert_eq!(stored[0].timestamp, genesis.sealed_at);
    }

    #[test]
    fn test_in_memory_matches_database_contract() {
        let store = InMemoryPersistence::new();
        assert_eq!(store.record_transfer(&sample_transfer()).unwrap(), 1);
        assert_eq!(store.record_transfer(&sample_transfer()).unwrap(), 2);

        let record = BlockRecord {
            block_hash: "ab".repeat(32),
            previous_hash: "0".to_string(),
            proof: 35293,
            timestamp: 9,
        };
        assert_eq!(store.record_block(&record).unwrap(), 1);

        let transfers = store.load_transfers().unwrap();
        assert_eq!(transfers.len(), 2);
        assert_eq!(transfers[1].id, 2);

        let blocks = store.load_blocks().unwrap();
        assert_eq!(blocks[0].proof, 35293);
        assert_eq!(blocks[0].block_hash, record.block_hash);
    }

    #[test]
    fn test_in_memory_clones_share_storage() {
        let store = InMemoryPersistence::new();
        let handle = store.clone();
        store.record_transfer(&sample_transfer()).unwrap();
        assert_eq!(handle.load_transfers().unwrap().len(), 1);
    }
}
