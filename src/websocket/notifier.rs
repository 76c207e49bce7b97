//! Notification dispatcher
//!
//! Best-effort, fire-and-forget push to a single user. If the user has no
//! live connection the call is a silent no-op: nothing is queued and nothing
//! is retried. The balance query endpoint remains the source of truth.

use std::sync::Arc;

use super::connection::{ConnectionDirectory, SendFailure};
use super::messages::WsMessage;
use crate::core_types::{ConnectionId, UserId};

/// What happened to a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued(ConnectionId),
    Offline,
    Failed(ConnectionId),
}

pub struct NotificationDispatcher {
    directory: Arc<ConnectionDirectory>,
}

impl NotificationDispatcher {
    pub fn new(directory: Arc<ConnectionDirectory>) -> Self {
        Self { directory }
    }

    pub fn notify(&self, user_id: UserId, message: WsMessage) -> Delivery {
        let event = message.event_name();
        match self.directory.send(user_id, message) {
            Ok(conn_id) => {
                tracing::debug!(user_id, conn_id, event, "Notification queued");
                Delivery::Queued(conn_id)
            }
            Err(SendFailure::Offline) => {
                tracing::debug!(user_id, event, "Recipient offline, notification dropped");
                Delivery::Offline
            }
            Err(SendFailure::Closed(conn_id)) => {
                tracing::warn!(user_id, conn_id, event, "Push failed - client disconnected");
                self.directory.release(user_id, conn_id);
                Delivery::Failed(conn_id)
            }
        }
    }
}
