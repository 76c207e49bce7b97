//! WebSocket handler for client connections
//!
//! Handles WebSocket upgrade, connection lifecycle, and message forwarding.

use axum::extract::ws::{Message, WebSocket};
use axum::{
    extract::{Query, State, WebSocketUpgrade},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::connection::ConnectionDirectory;
use super::messages::WsMessage;
use crate::auth::middleware::authenticate;
use crate::core_types::UserId;
use crate::gateway::{state::AppState, types::ApiError};

pub const USER_MISMATCH: &str = "Unauthorized - Token does not match user";

/// WebSocket connection query parameters
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsQuery {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
struct ClientFrame {
    #[serde(rename = "type")]
    kind: String,
}

/// WebSocket upgrade handler
///
/// Endpoint: GET /ws?userId=1001
///
/// The caller's token (Bearer header or `jwt` cookie) must name `userId`,
/// since registering replaces that user's current push channel.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let user = match authenticate(&state.tokens, &headers) {
        Ok(user) => user,
        Err(e) => return e.into_response(),
    };
    if user.user_id != params.user_id {
        tracing::warn!(token_user = user.user_id, requested = params.user_id, "WebSocket upgrade for another user");
        return ApiError::unauthorized(USER_MISMATCH).into_response();
    }

    let directory = state.directory.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, params.user_id, directory))
}

/// Handle WebSocket connection lifecycle
async fn handle_socket(socket: WebSocket, user_id: UserId, directory: Arc<ConnectionDirectory>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();

    // Queue the welcome first so it precedes any push
    let _ = tx.send(WsMessage::Connected { user_id });
    // The directory owns the only strong sender; the reader keeps a weak one
    let pong_tx = tx.downgrade();
    let conn_id = directory.register(user_id, tx);

    // Forward queued messages to the socket until the directory drops our sender
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!(user_id, error = %e, "Failed to encode push message");
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    // Handle incoming messages (ping, close)
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let is_ping = serde_json::from_str::<ClientFrame>(text.as_str())
                        .map(|frame| frame.kind == "ping")
                        .unwrap_or(false);
                    if is_ping {
                        match pong_tx.upgrade() {
                            Some(tx) => {
                                let _ = tx.send(WsMessage::Pong {});
                            }
                            None => break,
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    directory.release(user_id, conn_id);
    tracing::debug!(user_id, conn_id, "WebSocket session ended");
}
