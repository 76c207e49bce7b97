//! In-process deduplication of transfers by caller-supplied request id
//!
//! Keyed by `(sender, request_id)`. Duplicates arriving while the first
//! attempt is running wait on the same slot; once it succeeds they get the
//! stored outcome back without touching balances again, after `verify`
//! re-checks the caller's credentials. Failed attempts are not remembered,
//! so a caller may retry them with the same id.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;

use super::error::TransferError;
use super::types::TransferOutcome;
use crate::core_types::UserId;
use crate::money::Amount;

type Key = (UserId, String);
type Fingerprint = (UserId, Amount);

struct Completed {
    fingerprint: Fingerprint,
    outcome: TransferOutcome,
    at: Instant,
}

#[derive(Default)]
struct Slot {
    completed: Option<Completed>,
}

pub struct IdempotencyGuard {
    slots: DashMap<Key, Arc<Mutex<Slot>>>,
    ttl: Duration,
    capacity: usize,
}

impl IdempotencyGuard {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            slots: DashMap::new(),
            ttl,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Run `op` at most once per live key. A stored outcome is only handed
    /// back once `verify` accepts the duplicate.
    ///
    /// # Errors
    /// - whatever `verify` returns, on a replay
    /// - `IdempotencyConflict` if the key already completed with other parameters
    /// - whatever `op` returns
    pub async fn run<V, VFut, F, Fut>(
        &self,
        sender: UserId,
        request_id: String,
        fingerprint: Fingerprint,
        verify: V,
        op: F,
    ) -> Result<TransferOutcome, TransferError>
    where
        V: FnOnce() -> VFut,
        VFut: Future<Output = Result<(), TransferError>>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TransferOutcome, TransferError>>,
    {
        if self.slots.len() >= self.capacity {
            self.prune();
        }

        let slot = self
            .slots
            .entry((sender, request_id.clone()))
            .or_default()
            .clone();
        let mut guard = slot.lock().await;

        if let Some(done) = guard.completed.as_ref().filter(|c| c.at.elapsed() < self.ttl) {
            verify().await?;
            if done.fingerprint != fingerprint {
                tracing::warn!(sender, request_id = %request_id, "Request id reused with different parameters");
                return Err(TransferError::IdempotencyConflict);
            }
            tracing::info!(sender, request_id = %request_id, "Duplicate transfer request, replaying outcome");
            return Ok(done.outcome);
        }

        let result = op().await;
        if let Ok(outcome) = &result {
            guard.completed = Some(Completed {
                fingerprint,
                outcome: *outcome,
                at: Instant::now(),
            });
        }
        result
    }

    /// Drop idle slots that are expired or never completed.
    fn prune(&self) {
        let before = self.slots.len();
        let ttl = self.ttl;
        self.slots.retain(|_, slot| {
            // Someone holds a clone: in flight or about to lock
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(inner) => inner
                    .completed
                    .as_ref()
                    .is_some_and(|c| c.at.elapsed() < ttl),
                Err(_) => true,
            }
        });
        let after = self.slots.len();
        if after >= self.capacity {
            tracing::warn!(before, after, capacity = self.capacity, "Idempotency cache over capacity after pruning");
        } else {
            tracing::debug!(before, after, "Idempotency cache pruned");
        }
    }
}
