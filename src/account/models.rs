//! Data models for payment accounts

use serde::Deserialize;

use crate::core_types::{DEFAULT_BALANCE, DEFAULT_PASSKEY, UserId};
use crate::money::Balance;

/// Payment-relevant view of a user account
#[derive(Debug, Clone)]
pub struct Account {
    pub id: UserId,
    pub full_name: String,
    /// `None` when the stored value is not a well-formed balance
    pub balance: Option<Balance>,
    passkey: String,
}

impl Account {
    pub fn new(id: UserId, full_name: impl Into<String>, balance: Option<Balance>, passkey: impl Into<String>) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            balance,
            passkey: passkey.into(),
        }
    }

    /// Verbatim passkey comparison, constant time over the stored length.
    pub fn passkey_matches(&self, candidate: &str) -> bool {
        let stored = self.passkey.as_bytes();
        let given = candidate.as_bytes();
        let mut diff = stored.len() ^ given.len();
        for (i, b) in stored.iter().enumerate() {
            let g = given.get(i).copied().unwrap_or(0);
            diff |= usize::from(b ^ g);
        }
        diff == 0
    }
}

/// Account creation input (registration collaborator / seeding)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(default)]
    pub id: Option<UserId>,
    pub full_name: String,
    #[serde(default = "default_balance")]
    pub balance: Balance,
    #[serde(default = "default_passkey")]
    pub passkey: String,
}

impl NewAccount {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            id: None,
            full_name: full_name.into(),
            balance: default_balance(),
            passkey: default_passkey(),
        }
    }

    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_balance(mut self, balance: Balance) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_passkey(mut self, passkey: impl Into<String>) -> Self {
        self.passkey = passkey.into();
        self
    }
}

fn default_balance() -> Balance {
    Balance::new(DEFAULT_BALANCE).unwrap_or(Balance::ZERO)
}

fn default_passkey() -> String {
    DEFAULT_PASSKEY.to_string()
}
