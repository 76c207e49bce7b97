//! Peer-to-peer transfers
//!
//! # Architecture
//!
//! ```text
//! Gateway ──▶ TransferEngine ──▶ AccountStore::begin_pair ──▶ PairTransaction::commit
//!                   │                                                │
//!                   └── IdempotencyGuard (optional requestId)        └──▶ NotificationDispatcher
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Conservation**: a committed transfer debits and credits the same amount
//! 2. **Non-negativity**: a balance never goes below zero
//! 3. **Atomicity**: both balances are written together or not at all
//! 4. **Commit-before-notify**: the receiver is told only after commit

pub mod engine;
pub mod error;
pub mod idempotency;
pub mod types;

pub use engine::TransferEngine;
pub use error::{ErrorKind, TransferError};
pub use idempotency::IdempotencyGuard;
pub use types::{TransferCommand, TransferOutcome};
