//! In-memory account store
//!
//! One `tokio::sync::Mutex` per account. A pair transaction holds owned
//! guards on both accounts, taken in ascending id order, and writes the new
//! balances only in `commit`. Used for development mode and tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::models::{Account, NewAccount};
use super::store::{AccountStore, PairTransaction, StoreError};
use crate::core_types::UserId;
use crate::money::Balance;

pub struct MemoryAccountStore {
    accounts: DashMap<UserId, Arc<Mutex<Account>>>,
    next_id: AtomicI64,
    fail_next_commit: Arc<AtomicBool>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            next_id: AtomicI64::new(1),
            fail_next_commit: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make the next pair commit fail as if the backend went away.
    #[cfg(any(test, feature = "test-hooks"))]
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Replace an account's stored balance with an unreadable value.
    #[cfg(any(test, feature = "test-hooks"))]
    pub async fn corrupt_balance(&self, id: UserId) -> Result<(), StoreError> {
        let slot = self.slot(id).ok_or(StoreError::NotFound(id))?;
        slot.lock().await.balance = None;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    // Clone the Arc out so no shard lock is held across an await.
    fn slot(&self, id: UserId) -> Option<Arc<Mutex<Account>>> {
        self.accounts.get(&id).map(|entry| entry.value().clone())
    }
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, id: UserId) -> Result<Option<Account>, StoreError> {
        match self.slot(id) {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn begin_pair(
        &self,
        sender: UserId,
        receiver: UserId,
    ) -> Result<Box<dyn PairTransaction>, StoreError> {
        if sender == receiver {
            return Err(StoreError::SameAccount(sender));
        }
        let sender_slot = self.slot(sender).ok_or(StoreError::NotFound(sender))?;
        let receiver_slot = self.slot(receiver).ok_or(StoreError::NotFound(receiver))?;

        let (sender_guard, receiver_guard) = if sender < receiver {
            let s = sender_slot.lock_owned().await;
            let r = receiver_slot.lock_owned().await;
            (s, r)
        } else {
            let r = receiver_slot.lock_owned().await;
            let s = sender_slot.lock_owned().await;
            (s, r)
        };

        Ok(Box::new(MemoryPairTransaction {
            sender: sender_guard,
            receiver: receiver_guard,
            fail_commit: self.fail_next_commit.clone(),
        }))
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let id = match account.id {
            Some(id) => {
                self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
                id
            }
            None => self.next_id.fetch_add(1, Ordering::SeqCst),
        };
        let record = Account::new(id, account.full_name, Some(account.balance), account.passkey);

        match self.accounts.entry(id) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(record.clone())));
                tracing::debug!(user_id = id, "Account created in memory store");
                Ok(record)
            }
        }
    }
}

struct MemoryPairTransaction {
    sender: OwnedMutexGuard<Account>,
    receiver: OwnedMutexGuard<Account>,
    fail_commit: Arc<AtomicBool>,
}

#[async_trait]
impl PairTransaction for MemoryPairTransaction {
    fn sender(&self) -> &Account {
        &self.sender
    }

    fn receiver(&self) -> &Account {
        &self.receiver
    }

    async fn commit(
        self: Box<Self>,
        sender_balance: Balance,
        receiver_balance: Balance,
    ) -> Result<(), StoreError> {
        let mut this = *self;
        if this.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".to_string()));
        }
        this.sender.balance = Some(sender_balance);
        this.receiver.balance = Some(receiver_balance);
        Ok(())
    }
}
