//! WebSocket module for real-time push notifications
//!
//! A connected user is reachable through the [`ConnectionDirectory`]; the
//! [`NotificationDispatcher`] pushes events such as `paymentReceived` to
//! them on a best-effort basis.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod notifier;

pub use connection::{ConnectionDirectory, SendFailure, WsSender};
pub use handler::ws_handler;
pub use messages::WsMessage;
pub use notifier::{Delivery, NotificationDispatcher};
