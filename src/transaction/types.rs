/// Transfer record types for the interbank ledger
use crate::error::ChainError;
use crate::transaction::validation::validate_transfer_fields;
use sha2::{Digest, Sha256};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// A single value transfer between two parties.
///
/// Records are created by [`Ledger::submit`](crate::blockchain::Ledger::submit),
/// sit in the pending buffer until the next seal and are then owned by the
/// block that contains them.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TransferRecord {
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
    pub recorded_at: Timestamp,
}

impl TransferRecord {
    pub fn new(
        sender: &str,
        receiver: &str,
        amount: f64,
        recorded_at: Timestamp,
    ) -> Result<Self, ChainError> {
        validate_transfer_fields(sender, receiver, amount)?;

        Ok(TransferRecord {
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            amount,
            recorded_at,
        })
    }

    /// Feeds the canonical encoding of this record into `hasher`.
    ///
    /// Field order is fixed: sender, receiver, amount, recorded_at.
    pub fn update_hasher(&self, hasher: &mut Sha256) {
        update_str(hasher, &self.sender);
        update_str(hasher, &self.receiver);
        update_str(hasher, &canonical_amount(self.amount));
        hasher.update(self.recorded_at.to_le_bytes());
    }
}

/// Shortest round-trip decimal form of an amount. `Display` for `f64` does
/// not depend on the process locale.
pub fn canonical_amount(amount: f64) -> String {
    format!("{}", amount)
}

/// Length-prefixed so that ("ab", "c") and ("a", "bc") encode differently.
pub(crate) fn update_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}
