//! chatpay - Realtime chat payments core
//!
//! Peer-to-peer balance transfers between chat users, with a realtime
//! `paymentReceived` push to the receiver.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (UserId, ConnectionId, defaults)
//! - [`money`] - Enforced balance and amount types
//! - [`account`] - Account model and storage back ends (memory, PostgreSQL)
//! - [`transfer`] - Transfer engine, idempotency guard, error taxonomy
//! - [`query`] - Balance query service
//! - [`websocket`] - Connection directory, notification dispatcher, socket handler
//! - [`auth`] - JWT gate
//! - [`gateway`] - HTTP API (axum) and OpenAPI document

// Core types - must be first!
pub mod core_types;

pub mod money;

// Storage
pub mod account;
pub mod db;

// Services
pub mod query;
pub mod transfer;
pub mod websocket;

// Boundary
pub mod auth;
pub mod gateway;

// Ambient
pub mod config;
pub mod logging;

// Convenient re-exports at crate root
pub use core_types::{ConnectionId, UserId};
pub use money::{Amount, Balance, MoneyError};
pub use query::{BalanceQueryService, QueryError};
pub use transfer::{TransferCommand, TransferEngine, TransferError, TransferOutcome};
pub use websocket::{ConnectionDirectory, NotificationDispatcher, WsMessage};
