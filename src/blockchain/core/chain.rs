use crate::blockchain::core::clock::LedgerClock;
use crate::blockchain::core::validation::{scan_chain, ChainFault};
use crate::error::ChainError;
use crate::transaction::types::update_str;
use crate::transaction::{Timestamp, TransferRecord};
use sha2::{Digest, Sha256};
use tracing::debug;

/// `previous_hash` of the genesis block; there is no block before it.
pub const GENESIS_PREVIOUS_HASH: &str = "0";
/// Proof sealed into the genesis block by [`Ledger::new`].
pub const GENESIS_PROOF: u64 = 100;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub sequence_number: u64,
    pub sealed_at: Timestamp,
    pub transfers: Vec<TransferRecord>,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    /// SHA-256 of the block's canonical encoding, hex encoded.
    ///
    /// Fields are fed in a fixed order (sequence number, seal time, transfers,
    /// proof, previous hash) so equal blocks always hash equally.
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sequence_number.to_le_bytes());
        hasher.update(self.sealed_at.to_le_bytes());
        hasher.update((self.transfers.len() as u64).to_le_bytes());
        for transfer in &self.transfers {
            transfer.update_hasher(&mut hasher);
        }
        hasher.update(self.proof.to_le_bytes());
        update_str(&mut hasher, &self.previous_hash);
        hex::encode(hasher.finalize())
    }

    pub fn is_genesis(&self) -> bool {
        self.sequence_number == 1
    }

    /// Sum of all transfer amounts in this block.
    pub fn total_amount(&self) -> f64 {
        self.transfers.iter().map(|t| t.amount).sum()
    }
}

/// Free-standing form of [`Block::hash`] for callers that mirror blocks elsewhere.
pub fn hash_block(block: &Block) -> String {
    block.hash()
}

/// Append-only chain of sealed blocks plus the buffer of transfers awaiting
/// the next seal.
///
/// A `Ledger` always holds at least the genesis block. It is a plain owned
/// value; hosts that share it across threads must lock the whole ledger,
/// since `submit` and `seal` touch both the chain and the pending buffer.
#[derive(Debug, Clone)]
pub struct Ledger {
    blocks: Vec<Block>,
    pending: Vec<TransferRecord>,
    clock: LedgerClock,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Create a ledger whose genesis block carries [`GENESIS_PROOF`].
    pub fn new() -> Self {
        Self::with_genesis_proof(GENESIS_PROOF)
    }

    /// Create a ledger whose genesis block carries the given proof.
    pub fn with_genesis_proof(proof: u64) -> Self {
        let mut ledger = Ledger {
            blocks: Vec::new(),
            pending: Vec::new(),
            clock: LedgerClock::new(),
        };
        ledger.append_block(proof, GENESIS_PREVIOUS_HASH.to_string());
        ledger
    }

    /// Rebuild a ledger from previously exported blocks.
    ///
    /// Transfers are re-checked, but hash linkage is not: a restored chain
    /// may be inconsistent and [`Ledger::validate`] is how that is found.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, ChainError> {
        if blocks.is_empty() {
            return Err(ChainError::EmptyChainAccess);
        }

        let mut latest = 0;
        for block in &blocks {
            latest = latest.max(block.sealed_at);
            for transfer in &block.transfers {
                transfer.validate()?;
                latest = latest.max(transfer.recorded_at);
            }
        }

        Ok(Ledger {
            blocks,
            pending: Vec::new(),
            clock: LedgerClock::starting_at(latest),
        })
    }

    /// Queue a transfer for the next block.
    ///
    /// Returns the sequence number of the block that will contain it once
    /// sealed. Nothing is queued if the transfer is rejected.
    pub fn submit(&mut self, sender: &str, receiver: &str, amount: f64) -> Result<u64, ChainError> {
        let record = TransferRecord::new(sender, receiver, amount, self.clock.now())?;
        debug!(
            sender = %record.sender,
            receiver = %record.receiver,
            amount = record.amount,
            "transfer queued"
        );
        self.pending.push(record);
        Ok(self.next_sequence_number())
    }

    /// Seal all pending transfers into a new block and append it.
    ///
    /// Without an explicit `previous_hash` the hash of the current last block
    /// is used. An explicit value is trusted as given and is not checked
    /// against the chain; a wrong one is only caught by [`Ledger::validate`].
    pub fn seal(&mut self, proof: u64, previous_hash: Option<String>) -> Result<Block, ChainError> {
        let previous_hash = match previous_hash {
            Some(hash) => hash,
            None => self.last_block()?.hash(),
        };
        Ok(self.append_block(proof, previous_hash))
    }

    fn append_block(&mut self, proof: u64, previous_hash: String) -> Block {
        let block = Block {
            sequence_number: self.next_sequence_number(),
            sealed_at: self.clock.now(),
            transfers: std::mem::take(&mut self.pending),
            proof,
            previous_hash,
        };
        debug!(
            sequence_number = block.sequence_number,
            transfers = block.transfers.len(),
            proof = block.proof,
            "block sealed"
        );
        self.blocks.push(block.clone());
        block
    }

    /// True when every adjacent pair of blocks is correctly linked and
    /// carries a valid proof pairing. A lone genesis block is valid.
    pub fn validate(&self) -> bool {
        self.validation_report().is_empty()
    }

    /// Every inconsistency between adjacent blocks, in chain order.
    pub fn validation_report(&self) -> Vec<ChainFault> {
        scan_chain(&self.blocks)
    }

    pub fn chain(&self) -> &[Block] {
        &self.blocks
    }

    pub fn last_block(&self) -> Result<&Block, ChainError> {
        self.blocks.last().ok_or(ChainError::EmptyChainAccess)
    }

    pub fn pending(&self) -> &[TransferRecord] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn next_sequence_number(&self) -> u64 {
        self.blocks.len() as u64 + 1
    }
}
