//! Transfer Error Types
//!
//! Every way a transfer can fail. Each variant maps to an [`ErrorKind`], a
//! stable code and an HTTP status. Internal detail (storage messages) is only
//! ever logged; [`TransferError::public_message`] is what callers see.

use thiserror::Error;

use crate::account::StoreError;
use crate::core_types::UserId;

/// Error category, which decides retry and exposure policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Authorization,
    InsufficientFunds,
    DataIntegrity,
    Infrastructure,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("All fields are required")]
    MissingFields,

    #[error("Amount must be greater than 0")]
    InvalidAmount,

    #[error("Amount must be a whole number")]
    MalformedAmount,

    #[error("Cannot send payment to yourself")]
    SelfTransfer,

    #[error("Request id already used for a different payment")]
    IdempotencyConflict,

    #[error("Receiver balance would overflow")]
    BalanceOverflow,

    // === Account Errors ===
    #[error("User not found")]
    UserNotFound,

    // === Authorization Errors ===
    #[error("Invalid passkey")]
    InvalidPasskey,

    #[error("Sender does not match authenticated user")]
    SenderMismatch,

    // === Funds ===
    #[error("Insufficient balance")]
    InsufficientBalance,

    // === System Errors ===
    #[error("Stored balance of user {0} is not a valid amount")]
    DataIntegrity(UserId),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Transfer timed out after {0} ms")]
    Timeout(u64),
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::MissingFields
            | TransferError::InvalidAmount
            | TransferError::MalformedAmount
            | TransferError::SelfTransfer
            | TransferError::IdempotencyConflict
            | TransferError::BalanceOverflow => ErrorKind::Validation,
            TransferError::UserNotFound => ErrorKind::NotFound,
            TransferError::InvalidPasskey | TransferError::SenderMismatch => {
                ErrorKind::Authorization
            }
            TransferError::InsufficientBalance => ErrorKind::InsufficientFunds,
            TransferError::DataIntegrity(_) => ErrorKind::DataIntegrity,
            TransferError::Storage(_) | TransferError::Timeout(_) => ErrorKind::Infrastructure,
        }
    }

    /// Get the error code for logs and API clients
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::MissingFields => "MISSING_FIELDS",
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::MalformedAmount => "MALFORMED_AMOUNT",
            TransferError::SelfTransfer => "SELF_TRANSFER",
            TransferError::IdempotencyConflict => "IDEMPOTENCY_CONFLICT",
            TransferError::BalanceOverflow => "BALANCE_OVERFLOW",
            TransferError::UserNotFound => "USER_NOT_FOUND",
            TransferError::InvalidPasskey => "INVALID_PASSKEY",
            TransferError::SenderMismatch => "SENDER_MISMATCH",
            TransferError::InsufficientBalance => "INSUFFICIENT_BALANCE",
            TransferError::DataIntegrity(_) => "DATA_INTEGRITY",
            TransferError::Storage(_) => "STORAGE_ERROR",
            TransferError::Timeout(_) => "TIMEOUT",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Authorization | ErrorKind::InsufficientFunds => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::DataIntegrity | ErrorKind::Infrastructure => 500,
        }
    }

    /// Message safe to return to the caller
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::DataIntegrity | ErrorKind::Infrastructure => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => TransferError::UserNotFound,
            StoreError::SameAccount(_) => TransferError::SelfTransfer,
            other => TransferError::Storage(other.to_string()),
        }
    }
}
