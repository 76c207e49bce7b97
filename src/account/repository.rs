//! PostgreSQL account store
//!
//! A pair transaction is a `sqlx::Transaction` that has locked both rows with
//! `SELECT ... FOR UPDATE`, lower id first. `sqlx` rolls the transaction back
//! when it is dropped uncommitted, so every early return aborts cleanly.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

use super::models::{Account, NewAccount};
use super::store::{AccountStore, PairTransaction, StoreError};
use crate::core_types::UserId;
use crate::db::SafeRow;
use crate::money::Balance;

const UNIQUE_VIOLATION: &str = "23505";

pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_account(row: &PgRow) -> Result<Account, StoreError> {
    let id: UserId = row
        .try_get_log("id")
        .ok_or_else(|| StoreError::Backend("users.id unreadable".to_string()))?;
    let full_name: String = row.try_get_log("full_name").unwrap_or_default();
    let passkey: String = row
        .try_get_log("passkey")
        .ok_or_else(|| StoreError::Backend("users.passkey unreadable".to_string()))?;

    // NULL or out-of-range values surface as None
    let balance = row
        .try_get::<Option<i64>, _>("balance")
        .ok()
        .flatten()
        .and_then(|raw| Balance::new(raw).ok());

    Ok(Account::new(id, full_name, balance, passkey))
}

async fn lock_row(
    tx: &mut Transaction<'static, Postgres>,
    id: UserId,
) -> Result<Account, StoreError> {
    let row = sqlx::query(
        r#"SELECT id, full_name, balance, passkey FROM users
           WHERE id = $1
           FOR UPDATE"#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(StoreError::NotFound(id))?;

    row_to_account(&row)
}

#[async_trait]
impl AccountStore for PgAccountStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn load(&self, id: UserId) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query(r#"SELECT id, full_name, balance, passkey FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    async fn begin_pair(
        &self,
        sender: UserId,
        receiver: UserId,
    ) -> Result<Box<dyn PairTransaction>, StoreError> {
        if sender == receiver {
            return Err(StoreError::SameAccount(sender));
        }

        let mut tx = self.pool.begin().await?;

        let (sender_acc, receiver_acc) = if sender < receiver {
            let s = lock_row(&mut tx, sender).await?;
            let r = lock_row(&mut tx, receiver).await?;
            (s, r)
        } else {
            let r = lock_row(&mut tx, receiver).await?;
            let s = lock_row(&mut tx, sender).await?;
            (s, r)
        };

        Ok(Box::new(PgPairTransaction {
            tx,
            sender: sender_acc,
            receiver: receiver_acc,
        }))
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let result = match account.id {
            Some(id) => {
                sqlx::query(
                    r#"INSERT INTO users (id, full_name, balance, passkey)
                       VALUES ($1, $2, $3, $4)
                       RETURNING id, full_name, balance, passkey"#,
                )
                .bind(id)
                .bind(&account.full_name)
                .bind(account.balance.minor_units())
                .bind(&account.passkey)
                .fetch_one(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"INSERT INTO users (full_name, balance, passkey)
                       VALUES ($1, $2, $3)
                       RETURNING id, full_name, balance, passkey"#,
                )
                .bind(&account.full_name)
                .bind(account.balance.minor_units())
                .bind(&account.passkey)
                .fetch_one(&self.pool)
                .await
            }
        };

        let row = match result {
            Ok(row) => row,
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                return Err(StoreError::AlreadyExists(account.id.unwrap_or_default()));
            }
            Err(e) => return Err(e.into()),
        };

        if account.id.is_some() {
            // Keep BIGSERIAL ahead of explicitly assigned ids
            sqlx::query(
                r#"SELECT setval(pg_get_serial_sequence('users', 'id'),
                                 (SELECT MAX(id) FROM users))"#,
            )
            .execute(&self.pool)
            .await?;
        }

        row_to_account(&row)
    }
}

struct PgPairTransaction {
    tx: Transaction<'static, Postgres>,
    sender: Account,
    receiver: Account,
}

async fn write_balance(
    tx: &mut Transaction<'static, Postgres>,
    id: UserId,
    balance: Balance,
) -> Result<(), StoreError> {
    let result = sqlx::query(r#"UPDATE users SET balance = $1, updated_at = now() WHERE id = $2"#)
        .bind(balance.minor_units())
        .bind(id)
        .execute(&mut **tx)
        .await?;

    if result.rows_affected() != 1 {
        return Err(StoreError::Backend(format!(
            "balance update for user {} touched {} rows",
            id,
            result.rows_affected()
        )));
    }
    Ok(())
}

#[async_trait]
impl PairTransaction for PgPairTransaction {
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
        let PgPairTransaction {
            mut tx,
            sender,
            receiver,
        } = *self;

        write_balance(&mut tx, sender.id, sender_balance).await?;
        write_balance(&mut tx, receiver.id, receiver_balance).await?;
        tx.commit().await?;
        Ok(())
    }
}
