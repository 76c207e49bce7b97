//! Connection directory
//!
//! Maps a user to at most one live WebSocket connection using DashMap for
//! concurrent access. Registering again replaces the previous entry (last
//! connection wins); the replaced sender is dropped, which ends that socket's
//! forwarding task. Only the latest session of a user receives pushes.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use super::messages::WsMessage;
use crate::core_types::{ConnectionId, UserId};

/// WebSocket sender channel type
pub type WsSender = mpsc::UnboundedSender<WsMessage>;

struct LiveConnection {
    id: ConnectionId,
    tx: WsSender,
}

/// Outcome of pushing to a user's connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFailure {
    /// No connection registered for the user
    Offline,
    /// A connection is registered but its socket task has gone away
    Closed(ConnectionId),
}

pub struct ConnectionDirectory {
    connections: DashMap<UserId, LiveConnection>,
    next_conn_id: AtomicU64,
}

impl ConnectionDirectory {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            next_conn_id: AtomicU64::new(1),
        }
    }

    /// Register `tx` as the live connection for `user_id`.
    ///
    /// Returns the new connection ID. Any previous connection is replaced.
    pub fn register(&self, user_id: UserId, tx: WsSender) -> ConnectionId {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let previous = self
            .connections
            .insert(user_id, LiveConnection { id: conn_id, tx });

        match previous {
            Some(old) => tracing::info!(
                user_id,
                conn_id,
                replaced_conn_id = old.id,
                "WebSocket connection replaced"
            ),
            None => tracing::info!(user_id, conn_id, "WebSocket connection registered"),
        }
        conn_id
    }

    /// Remove whatever connection is registered for `user_id`.
    pub fn unregister(&self, user_id: UserId) -> Option<ConnectionId> {
        let removed = self.connections.remove(&user_id).map(|(_, conn)| conn.id);
        if let Some(conn_id) = removed {
            tracing::info!(user_id, conn_id, "WebSocket connection unregistered");
        }
        removed
    }

    /// Remove the entry only if `conn_id` is still the current connection.
    ///
    /// A superseded socket that closes late must not evict its replacement.
    pub fn release(&self, user_id: UserId, conn_id: ConnectionId) -> bool {
        let removed = self
            .connections
            .remove_if(&user_id, |_, conn| conn.id == conn_id)
            .is_some();
        if removed {
            tracing::info!(user_id, conn_id, "WebSocket connection released");
        }
        removed
    }

    pub fn lookup(&self, user_id: UserId) -> Option<ConnectionId> {
        self.connections.get(&user_id).map(|conn| conn.id)
    }

    /// Queue `message` on the user's live connection.
    pub fn send(&self, user_id: UserId, message: WsMessage) -> Result<ConnectionId, SendFailure> {
        let conn = self.connections.get(&user_id).ok_or(SendFailure::Offline)?;
        let conn_id = conn.id;
        conn.tx
            .send(message)
            .map(|_| conn_id)
            .map_err(|_| SendFailure::Closed(conn_id))
    }

    pub fn online_users(&self) -> Vec<UserId> {
        self.connections.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Drop every connection; used on server shutdown.
    pub fn clear(&self) {
        let count = self.connections.len();
        self.connections.clear();
        tracing::info!(count, "Connection directory cleared");
    }
}

impl Default for ConnectionDirectory {
    fn default() -> Self {
        Self::new()
    }
}
