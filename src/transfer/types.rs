//! Transfer request and outcome values (request scoped, never persisted)

use crate::core_types::UserId;
use crate::money::{Amount, Balance};

/// A validated transfer request
#[derive(Debug, Clone)]
pub struct TransferCommand {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub amount: Amount,
    pub passkey: String,
    /// Caller-supplied deduplication key
    pub request_id: Option<String>,
}

impl TransferCommand {
    pub fn new(sender_id: UserId, receiver_id: UserId, amount: Amount, passkey: impl Into<String>) -> Self {
        Self {
            sender_id,
            receiver_id,
            amount,
            passkey: passkey.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Parameters a replayed request must repeat exactly
    pub(crate) fn fingerprint(&self) -> (UserId, Amount) {
        (self.receiver_id, self.amount)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub sender_balance: Balance,
    pub receiver_balance: Balance,
}
