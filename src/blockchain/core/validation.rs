use crate::blockchain::core::chain::Block;
use sha2::{Digest, Sha256};
use std::fmt;

/// Leading hex characters a proof pairing digest must carry.
pub const PROOF_PREFIX: &str = "0000";

/// Admission predicate linking a block's proof to its predecessor's.
///
/// Hashes the decimal concatenation of both proofs and checks the digest
/// prefix. It only checks; finding a qualifying proof is the caller's job.
pub fn valid_proof(last_proof: u64, proof: u64) -> bool {
    let guess = format!("{}{}", last_proof, proof);
    let guess_hash = hex::encode(Sha256::digest(guess.as_bytes()));
    guess_hash.starts_with(PROOF_PREFIX)
}

/// An inconsistency found between two adjacent blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainFault {
    /// The block's stored `previous_hash` does not match its predecessor's hash.
    BrokenLink {
        sequence_number: u64,
        expected: String,
        found: String,
    },
    /// The block's proof does not pair with its predecessor's proof.
    InvalidProof {
        sequence_number: u64,
        last_proof: u64,
        proof: u64,
    },
}

impl ChainFault {
    pub fn sequence_number(&self) -> u64 {
        match self {
            ChainFault::BrokenLink { sequence_number, .. } => *sequence_number,
            ChainFault::InvalidProof { sequence_number, .. } => *sequence_number,
        }
    }
}

impl fmt::Display for ChainFault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainFault::BrokenLink {
                sequence_number,
                expected,
                found,
            } => write!(
                f,
                "Block {}: previous hash mismatch (expected {}, found {})",
                sequence_number, expected, found
            ),
            ChainFault::InvalidProof {
                sequence_number,
                last_proof,
                proof,
            } => write!(
                f,
                "Block {}: proof {} does not pair with previous proof {}",
                sequence_number, proof, last_proof
            ),
        }
    }
}

/// Walks every adjacent pair and collects each failed check.
///
/// Hashes are recomputed from the blocks as they are now, so a block edited
/// after sealing shows up as a broken link on its successor.
pub fn scan_chain(blocks: &[Block]) -> Vec<ChainFault> {
    let mut faults = Vec::new();

    for pair in blocks.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);

        let expected = previous.hash();
        if current.previous_hash != expected {
            faults.push(ChainFault::BrokenLink {
                sequence_number: current.sequence_number,
                expected,
                found: current.previous_hash.clone(),
            });
        }

        if !valid_proof(previous.proof, current.proof) {
            faults.push(ChainFault::InvalidProof {
                sequence_number: current.sequence_number,
                last_proof: previous.proof,
                proof: current.proof,
            });
        }
    }

    faults
}
