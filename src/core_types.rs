//! Core types used throughout the system
//!
//! These are fundamental type aliases used by all modules.

/// User ID - primary key of an account.
///
/// Issued by the registration collaborator; opaque to this crate apart from
/// being totally ordered, which the transfer engine relies on for lock order.
pub type UserId = i64;

/// Realtime connection identifier, unique for the lifetime of the process.
pub type ConnectionId = u64;

/// Balance assigned to accounts created without an explicit one.
pub const DEFAULT_BALANCE: i64 = 45_000;

/// Passkey assigned to accounts created without an explicit one.
pub const DEFAULT_PASSKEY: &str = "1234";
