//! Balance Query Service
//!
//! Read-only lookup of a user's current balance.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, warn};

use crate::account::{AccountStore, StoreError};
use crate::core_types::UserId;
use crate::money::Balance;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("User not found")]
    NotFound,

    #[error("Stored balance of user {0} is not a valid amount")]
    DataIntegrity(UserId),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl QueryError {
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::NotFound => "USER_NOT_FOUND",
            QueryError::DataIntegrity(_) => "DATA_INTEGRITY",
            QueryError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            QueryError::NotFound => 404,
            QueryError::DataIntegrity(_) | QueryError::Storage(_) => 500,
        }
    }

    pub fn public_message(&self) -> String {
        match self {
            QueryError::NotFound => self.to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl From<StoreError> for QueryError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => QueryError::NotFound,
            other => QueryError::Storage(other.to_string()),
        }
    }
}

pub struct BalanceQueryService {
    store: Arc<dyn AccountStore>,
    /// Value reported in place of an unreadable stored balance
    legacy_fallback: Option<Balance>,
}

impl BalanceQueryService {
    pub fn new(store: Arc<dyn AccountStore>, legacy_fallback: Option<Balance>) -> Self {
        Self {
            store,
            legacy_fallback,
        }
    }

    pub async fn get_balance(&self, user_id: UserId) -> Result<Balance, QueryError> {
        let account = self
            .store
            .load(user_id)
            .await?
            .ok_or(QueryError::NotFound)?;

        match (account.balance, self.legacy_fallback) {
            (Some(balance), _) => Ok(balance),
            (None, Some(fallback)) => {
                warn!(user_id, fallback = %fallback, "Unreadable balance, reporting fallback");
                Ok(fallback)
            }
            (None, None) => {
                error!(user_id, "Unreadable stored balance");
                Err(QueryError::DataIntegrity(user_id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::{MemoryAccountStore, NewAccount};

    async fn store_with_bob() -> Arc<MemoryAccountStore> {
        let store = Arc::new(MemoryAccountStore::new());
        store
            .create(NewAccount::new("Bob").with_id(7).with_balance(Balance::new(1_250).unwrap()))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_get_balance() {
        let service = BalanceQueryService::new(store_with_bob().await, None);
        assert_eq!(service.get_balance(7).await.unwrap().minor_units(), 1_250);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let service = BalanceQueryService::new(store_with_bob().await, None);
        let err = service.get_balance(999_999).await.unwrap_err();
        assert_eq!(err, QueryError::NotFound);
        assert_eq!(err.http_status(), 404);
        assert_eq!(err.public_message(), "User not found");
    }

    #[tokio::test]
    async fn test_corrupt_balance_without_fallback() {
        let store = store_with_bob().await;
        store.corrupt_balance(7).await.unwrap();
        let service = BalanceQueryService::new(store, None);

        let err = service.get_balance(7).await.unwrap_err();
        assert_eq!(err, QueryError::DataIntegrity(7));
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[tokio::test]
    async fn test_corrupt_balance_with_legacy_fallback() {
        let store = store_with_bob().await;
        store.corrupt_balance(7).await.unwrap();
        let service = BalanceQueryService::new(store, Some(Balance::new(45_000).unwrap()));

        assert_eq!(service.get_balance(7).await.unwrap().minor_units(), 45_000);
    }

    #[tokio::test]
    async fn test_new_account_reports_default_balance() {
        let store = Arc::new(MemoryAccountStore::new());
        let account = store.create(NewAccount::new("Carol")).await.unwrap();
        let service = BalanceQueryService::new(store, None);

        assert_eq!(
            service.get_balance(account.id).await.unwrap().minor_units(),
            crate::core_types::DEFAULT_BALANCE
        );
    }
}
