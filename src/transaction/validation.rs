/// Validation logic for transfer records separated from type definitions
use crate::error::ChainError;
use crate::transaction::types::TransferRecord;

/// Checks the transfer invariant: both parties named and a positive, finite amount.
pub fn validate_transfer_fields(sender: &str, receiver: &str, amount: f64) -> Result<(), ChainError> {
    if sender.trim().is_empty() {
        return Err(ChainError::InvalidTransfer(
            "Sender must not be empty".to_string(),
        ));
    }

    if receiver.trim().is_empty() {
        return Err(ChainError::InvalidTransfer(
            "Receiver must not be empty".to_string(),
        ));
    }

    if !amount.is_finite() {
        return Err(ChainError::InvalidTransfer(format!(
            "Amount must be a finite number, got {}",
            amount
        )));
    }

    if amount <= 0.0 {
        return Err(ChainError::InvalidTransfer(format!(
            "Amount must be positive, got {}",
            amount
        )));
    }

    Ok(())
}

impl TransferRecord {
    /// Re-checks the invariant on an existing record, e.g. one restored from an export.
    pub fn validate(&self) -> Result<(), ChainError> {
        validate_transfer_fields(&self.sender, &self.receiver, self.amount)
    }
}
