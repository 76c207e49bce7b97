//! Account storage seam
//!
//! The transfer engine only talks to storage through [`AccountStore`] and the
//! scoped [`PairTransaction`] it hands out. A pair transaction holds exclusive
//! access to two accounts until it is committed or dropped; dropping it
//! without `commit` rolls back and releases both accounts.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{Account, NewAccount};
use crate::core_types::UserId;
use crate::money::Balance;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Account not found: {0}")]
    NotFound(UserId),

    #[error("Pair transaction requires two distinct accounts (got {0} twice)")]
    SameAccount(UserId),

    #[error("Account already exists: {0}")]
    AlreadyExists(UserId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Unlocked read of a single account.
    async fn load(&self, id: UserId) -> Result<Option<Account>, StoreError>;

    /// Open a scoped transaction over `sender` and `receiver`.
    ///
    /// Implementations acquire both accounts in ascending id order so that
    /// opposite transfers between the same pair cannot deadlock.
    ///
    /// # Errors
    /// - `NotFound` for whichever account does not exist
    /// - `SameAccount` if both ids are equal
    async fn begin_pair(
        &self,
        sender: UserId,
        receiver: UserId,
    ) -> Result<Box<dyn PairTransaction>, StoreError>;

    /// Insert an account. Used by registration and seeding, never by transfers.
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;
}

#[async_trait]
pub trait PairTransaction: Send {
    fn sender(&self) -> &Account;

    fn receiver(&self) -> &Account;

    /// Persist both balances together. On error nothing has been applied.
    async fn commit(
        self: Box<Self>,
        sender_balance: Balance,
        receiver_balance: Balance,
    ) -> Result<(), StoreError>;
}
