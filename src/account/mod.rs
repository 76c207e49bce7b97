//! Account storage
//!
//! The authoritative per-user balance and the storage back ends that guard
//! it. Balances change only through a [`PairTransaction`] opened by the
//! transfer engine.

pub mod memory;
pub mod models;
pub mod repository;
pub mod store;

pub use memory::MemoryAccountStore;
pub use models::{Account, NewAccount};
pub use repository::PgAccountStore;
pub use store::{AccountStore, PairTransaction, StoreError};

// Re-export Database from top-level db module
pub use crate::db::Database;
