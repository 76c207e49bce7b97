//! Transfer Engine
//!
//! Moves an amount from one balance to another. Both accounts are held
//! exclusively (ascending id order) from the moment they are read until the
//! new balances are committed, so concurrent transfers touching either
//! account serialize and no update is lost. Any return before `commit`
//! drops the pair transaction, which rolls back.
//!
//! ```text
//! validate ─▶ begin_pair (lock lo, lock hi) ─▶ passkey ─▶ debit/credit ─▶ commit ─▶ notify
//!                    └──────────── any error: drop = rollback ─────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use super::error::TransferError;
use super::idempotency::IdempotencyGuard;
use super::types::{TransferCommand, TransferOutcome};
use crate::account::{AccountStore, PairTransaction};
use crate::config::TransferConfig;
use crate::money::{Balance, MoneyError};
use crate::websocket::{NotificationDispatcher, WsMessage};

/// Balances computed while both accounts are held
struct Prepared {
    tx: Box<dyn PairTransaction>,
    sender_after: Balance,
    receiver_after: Balance,
    sender_name: String,
}

pub struct TransferEngine {
    store: Arc<dyn AccountStore>,
    dispatcher: Arc<NotificationDispatcher>,
    idempotency: IdempotencyGuard,
    lock_timeout: Duration,
}

impl TransferEngine {
    pub fn new(
        store: Arc<dyn AccountStore>,
        dispatcher: Arc<NotificationDispatcher>,
        config: &TransferConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            idempotency: IdempotencyGuard::new(
                Duration::from_secs(config.idempotency_ttl_secs),
                config.idempotency_capacity,
            ),
            lock_timeout: Duration::from_millis(config.lock_timeout_ms),
        }
    }

    /// Execute a transfer.
    ///
    /// On success both balances are committed together and the receiver is
    /// sent one `paymentReceived` event. On error neither balance changed.
    pub async fn transfer(&self, cmd: TransferCommand) -> Result<TransferOutcome, TransferError> {
        if cmd.sender_id == cmd.receiver_id {
            return Err(TransferError::SelfTransfer);
        }

        let result = match cmd.request_id.clone() {
            Some(request_id) => {
                self.idempotency
                    .run(
                        cmd.sender_id,
                        request_id,
                        cmd.fingerprint(),
                        || self.verify_sender(&cmd),
                        || self.execute(&cmd),
                    )
                    .await
            }
            None => self.execute(&cmd).await,
        };

        if let Err(e) = &result {
            match e.http_status() {
                500 => error!(
                    sender = cmd.sender_id,
                    receiver = cmd.receiver_id,
                    code = e.code(),
                    error = %e,
                    "Transfer aborted"
                ),
                _ => info!(
                    sender = cmd.sender_id,
                    receiver = cmd.receiver_id,
                    code = e.code(),
                    "Transfer rejected"
                ),
            }
        }
        result
    }

    async fn execute(&self, cmd: &TransferCommand) -> Result<TransferOutcome, TransferError> {
        let timeout_ms = u64::try_from(self.lock_timeout.as_millis()).unwrap_or(u64::MAX);
        let prepared = tokio::time::timeout(self.lock_timeout, self.prepare(cmd))
            .await
            .map_err(|_| TransferError::Timeout(timeout_ms))??;

        let Prepared {
            tx,
            sender_after,
            receiver_after,
            sender_name,
        } = prepared;

        tx.commit(sender_after, receiver_after).await?;

        info!(
            sender = cmd.sender_id,
            receiver = cmd.receiver_id,
            amount = cmd.amount.minor_units(),
            sender_balance = sender_after.minor_units(),
            receiver_balance = receiver_after.minor_units(),
            "Transfer committed"
        );

        // Only after commit; the outcome does not depend on delivery
        let delivery = self.dispatcher.notify(
            cmd.receiver_id,
            WsMessage::PaymentReceived {
                amount: cmd.amount,
                sender_name,
                new_balance: receiver_after,
            },
        );
        debug!(receiver = cmd.receiver_id, ?delivery, "paymentReceived dispatched");

        Ok(TransferOutcome {
            sender_balance: sender_after,
            receiver_balance: receiver_after,
        })
    }

    /// Credential check for a replayed request, which never reaches `prepare`.
    async fn verify_sender(&self, cmd: &TransferCommand) -> Result<(), TransferError> {
        let sender = self
            .store
            .load(cmd.sender_id)
            .await?
            .ok_or(TransferError::UserNotFound)?;
        if !sender.passkey_matches(&cmd.passkey) {
            return Err(TransferError::InvalidPasskey);
        }
        Ok(())
    }

    async fn prepare(&self, cmd: &TransferCommand) -> Result<Prepared, TransferError> {
        let tx = self.store.begin_pair(cmd.sender_id, cmd.receiver_id).await?;

        if !tx.sender().passkey_matches(&cmd.passkey) {
            return Err(TransferError::InvalidPasskey);
        }

        let sender_balance = tx
            .sender()
            .balance
            .ok_or(TransferError::DataIntegrity(cmd.sender_id))?;
        let receiver_balance = tx
            .receiver()
            .balance
            .ok_or(TransferError::DataIntegrity(cmd.receiver_id))?;

        let sender_after = sender_balance.debit(cmd.amount).map_err(|e| match e {
            MoneyError::Insufficient => TransferError::InsufficientBalance,
            _ => TransferError::InvalidAmount,
        })?;
        let receiver_after = receiver_balance
            .credit(cmd.amount)
            .map_err(|_| TransferError::BalanceOverflow)?;

        let sender_name = tx.sender().full_name.clone();
        Ok(Prepared {
            tx,
            sender_after,
            receiver_after,
            sender_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{MemoryAccountStore, NewAccount};
    use crate::core_types::UserId;
    use crate::money::Amount;
    use crate::websocket::ConnectionDirectory;
    use tokio::sync::mpsc;

    struct Harness {
        engine: Arc<TransferEngine>,
        store: Arc<MemoryAccountStore>,
        directory: Arc<ConnectionDirectory>,
    }

    impl Harness {
        async fn new(accounts: &[(UserId, &str, i64)]) -> Self {
            let store = Arc::new(MemoryAccountStore::new());
            for (id, name, balance) in accounts {
                store
                    .create(
                        NewAccount::new(*name)
                            .with_id(*id)
                            .with_balance(Balance::new(*balance).unwrap()),
                    )
                    .await
                    .unwrap();
            }
            let directory = Arc::new(ConnectionDirectory::new());
            let dispatcher = Arc::new(NotificationDispatcher::new(directory.clone()));
            let engine = Arc::new(TransferEngine::new(
                store.clone(),
                dispatcher,
                &TransferConfig::default(),
            ));
            Self {
                engine,
                store,
                directory,
            }
        }

        async fn balance(&self, id: UserId) -> i64 {
            self.store
                .load(id)
                .await
                .unwrap()
                .unwrap()
                .balance
                .unwrap()
                .minor_units()
        }
    }

    fn cmd(sender: UserId, receiver: UserId, amount: i64) -> TransferCommand {
        TransferCommand::new(sender, receiver, Amount::new(amount).unwrap(), "1234")
    }

    #[tokio::test]
    async fn test_transfer_happy_path_notifies_receiver() {
        let h = Harness::new(&[(1, "Alice", 45_000), (2, "Bob", 0)]).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        h.directory.register(2, tx);

        let out = h.engine.transfer(cmd(1, 2, 15_000)).await.unwrap();
        assert_eq!(out.sender_balance.minor_units(), 30_000);
        assert_eq!(out.receiver_balance.minor_units(), 15_000);
        assert_eq!(h.balance(1).await, 30_000);
        assert_eq!(h.balance(2).await, 15_000);

        let pushed = rx.try_recv().unwrap();
        assert_eq!(
            pushed,
            WsMessage::PaymentReceived {
                amount: Amount::new(15_000).unwrap(),
                sender_name: "Alice".to_string(),
                new_balance: Balance::new(15_000).unwrap(),
            }
        );
        // Exactly one event
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_offline_receiver_still_succeeds() {
        let h = Harness::new(&[(1, "Alice", 100), (2, "Bob", 0)]).await;
        let out = h.engine.transfer(cmd(1, 2, 100)).await.unwrap();
        assert_eq!(out.sender_balance, Balance::ZERO);
        assert_eq!(out.receiver_balance.minor_units(), 100);
    }

    #[tokio::test]
    async fn test_insufficient_balance_changes_nothing() {
        let h = Harness::new(&[(1, "Alice", 100), (2, "Bob", 0)]).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        h.directory.register(2, tx);

        let err = h.engine.transfer(cmd(1, 2, 500)).await.unwrap_err();
        assert_eq!(err, TransferError::InsufficientBalance);
        assert_eq!(err.to_string(), "Insufficient balance");
        assert_eq!(h.balance(1).await, 100);
        assert_eq!(h.balance(2).await, 0);
        assert!(rx.try_recv().is_err(), "no notification on failure");
    }

    #[tokio::test]
    async fn test_wrong_passkey_rejected_even_with_funds() {
        let h = Harness::new(&[(1, "Alice", 45_000), (2, "Bob", 0)]).await;
        let mut bad = cmd(1, 2, 10);
        bad.passkey = "0000".to_string();

        assert_eq!(
            h.engine.transfer(bad).await.unwrap_err(),
            TransferError::InvalidPasskey
        );
        assert_eq!(h.balance(1).await, 45_000);
        assert_eq!(h.balance(2).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_accounts() {
        let h = Harness::new(&[(1, "Alice", 100)]).await;
        assert_eq!(
            h.engine.transfer(cmd(1, 99, 10)).await.unwrap_err(),
            TransferError::UserNotFound
        );
        assert_eq!(
            h.engine.transfer(cmd(99, 1, 10)).await.unwrap_err(),
            TransferError::UserNotFound
        );
        assert_eq!(h.balance(1).await, 100);
    }

    #[tokio::test]
    async fn test_self_transfer_rejected() {
        let h = Harness::new(&[(1, "Alice", 100)]).await;
        assert_eq!(
            h.engine.transfer(cmd(1, 1, 10)).await.unwrap_err(),
            TransferError::SelfTransfer
        );
        assert_eq!(h.balance(1).await, 100);
    }

    #[tokio::test]
    async fn test_commit_failure_rolls_back() {
        let h = Harness::new(&[(1, "Alice", 100), (2, "Bob", 0)]).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        h.directory.register(2, tx);

        h.store.fail_next_commit();
        let err = h.engine.transfer(cmd(1, 2, 40)).await.unwrap_err();
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(h.balance(1).await, 100);
        assert_eq!(h.balance(2).await, 0);
        assert!(rx.try_recv().is_err());

        // Store recovered; the same transfer now goes through
        h.engine.transfer(cmd(1, 2, 40)).await.unwrap();
        assert_eq!(h.balance(1).await, 60);
        assert_eq!(h.balance(2).await, 40);
    }

    #[tokio::test]
    async fn test_corrupt_balance_is_data_integrity_error() {
        let h = Harness::new(&[(1, "Alice", 100), (2, "Bob", 0)]).await;
        h.store.corrupt_balance(2).await.unwrap();

        assert_eq!(
            h.engine.transfer(cmd(1, 2, 10)).await.unwrap_err(),
            TransferError::DataIntegrity(2)
        );
        assert_eq!(h.balance(1).await, 100);
    }

    #[tokio::test]
    async fn test_receiver_overflow_rejected() {
        let h = Harness::new(&[(1, "Alice", 100), (2, "Bob", i64::MAX)]).await;
        assert_eq!(
            h.engine.transfer(cmd(1, 2, 1)).await.unwrap_err(),
            TransferError::BalanceOverflow
        );
        assert_eq!(h.balance(1).await, 100);
    }

    #[tokio::test]
    async fn test_lock_timeout_aborts() {
        let h = Harness::new(&[(1, "Alice", 100), (2, "Bob", 0)]).await;
        let config = TransferConfig {
            lock_timeout_ms: 20,
            ..TransferConfig::default()
        };
        let dispatcher = Arc::new(NotificationDispatcher::new(h.directory.clone()));
        let engine = TransferEngine::new(h.store.clone(), dispatcher, &config);

        // Hold both accounts so the engine cannot acquire them
        let held = h.store.begin_pair(1, 2).await.unwrap();
        let err = engine.transfer(cmd(1, 2, 10)).await.unwrap_err();
        assert_eq!(err, TransferError::Timeout(20));
        drop(held);

        assert_eq!(h.balance(1).await, 100);
        assert_eq!(h.balance(2).await, 0);
    }

    #[tokio::test]
    async fn test_request_id_replay_does_not_double_spend() {
        let h = Harness::new(&[(1, "Alice", 100), (2, "Bob", 0)]).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        h.directory.register(2, tx);

        let first = h
            .engine
            .transfer(cmd(1, 2, 30).with_request_id("abc"))
            .await
            .unwrap();
        let second = h
            .engine
            .transfer(cmd(1, 2, 30).with_request_id("abc"))
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(h.balance(1).await, 70);
        assert_eq!(h.balance(2).await, 30);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "replay must not notify again");
    }

    #[tokio::test]
    async fn test_replay_with_wrong_passkey_rejected() {
        let h = Harness::new(&[(1, "Alice", 100), (2, "Bob", 0)]).await;
        h.engine
            .transfer(cmd(1, 2, 30).with_request_id("k"))
            .await
            .unwrap();

        let mut replay = cmd(1, 2, 30).with_request_id("k");
        replay.passkey = "WRONG".to_string();
        assert_eq!(
            h.engine.transfer(replay).await.unwrap_err(),
            TransferError::InvalidPasskey
        );

        // The right passkey still gets the stored outcome
        let again = h
            .engine
            .transfer(cmd(1, 2, 30).with_request_id("k"))
            .await
            .unwrap();
        assert_eq!(again.sender_balance.minor_units(), 70);
        assert_eq!(h.balance(1).await, 70);
        assert_eq!(h.balance(2).await, 30);
    }

    #[tokio::test]
    async fn test_missing_receiver_reported_before_wrong_passkey() {
        let h = Harness::new(&[(1, "Alice", 100)]).await;
        let mut bad = cmd(1, 99, 10);
        bad.passkey = "0000".to_string();
        assert_eq!(
            h.engine.transfer(bad).await.unwrap_err(),
            TransferError::UserNotFound
        );
    }

    #[tokio::test]
    async fn test_wrong_passkey_reported_before_insufficient_balance() {
        let h = Harness::new(&[(1, "Alice", 100), (2, "Bob", 0)]).await;
        let mut bad = cmd(1, 2, 5_000);
        bad.passkey = "0000".to_string();
        assert_eq!(
            h.engine.transfer(bad).await.unwrap_err(),
            TransferError::InvalidPasskey
        );
        assert_eq!(h.balance(1).await, 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_opposite_concurrent_transfers_are_serializable() {
        for _ in 0..50 {
            let h = Harness::new(&[(1, "A", 100), (2, "B", 100)]).await;
            let e1 = h.engine.clone();
            let e2 = h.engine.clone();

            let t1 = tokio::spawn(async move { e1.transfer(cmd(1, 2, 80)).await });
            let t2 = tokio::spawn(async move { e2.transfer(cmd(2, 1, 80)).await });
            let r1 = t1.await.unwrap();
            let r2 = t2.await.unwrap();

            // Both orders are valid and each succeeds, ending in a net no-op
            assert!(r1.is_ok() && r2.is_ok(), "{r1:?} {r2:?}");
            assert_eq!(h.balance(1).await, 100);
            assert_eq!(h.balance(2).await, 100);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_transfers_conserve_money() {
        let ids: [UserId; 4] = [1, 2, 3, 4];
        let h = Harness::new(&[(1, "A", 1_000), (2, "B", 1_000), (3, "C", 1_000), (4, "D", 1_000)]).await;

        let mut handles = Vec::new();
        for i in 0..200usize {
            let engine = h.engine.clone();
            let from = ids[i % 4];
            let to = ids[(i * 7 + 1) % 4];
            let amount = (i as i64 % 13) * 37 + 1;
            handles.push(tokio::spawn(async move {
                engine.transfer(cmd(from, to, amount)).await
            }));
        }
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_)
                | Err(TransferError::InsufficientBalance)
                | Err(TransferError::SelfTransfer) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        let mut total = 0;
        for id in ids {
            let bal = h.balance(id).await;
            assert!(bal >= 0);
            total += bal;
        }
        assert_eq!(total, 4_000);
    }
}
