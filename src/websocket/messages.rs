//! Realtime push messages
//!
//! Every frame is `{"event": <name>, "data": <payload>}`; the serde tag is the
//! event name the client subscribes to.

use serde::{Deserialize, Serialize};

use crate::core_types::UserId;
use crate::money::{Amount, Balance};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum WsMessage {
    /// Sent once after the upgrade completes
    #[serde(rename_all = "camelCase")]
    Connected { user_id: UserId },

    /// A transfer to this user was committed
    #[serde(rename_all = "camelCase")]
    PaymentReceived {
        amount: Amount,
        sender_name: String,
        new_balance: Balance,
    },

    /// Reply to a client `{"type":"ping"}`
    Pong {},
}

impl WsMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            WsMessage::Connected { .. } => "connected",
            WsMessage::PaymentReceived { .. } => "paymentReceived",
            WsMessage::Pong {} => "pong",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payment_received_wire_format() {
        let msg = WsMessage::PaymentReceived {
            amount: Amount::new(15_000).unwrap(),
            sender_name: "Alice".to_string(),
            new_balance: Balance::new(15_000).unwrap(),
        };
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "event": "paymentReceived",
                "data": {"amount": 15000, "senderName": "Alice", "newBalance": 15000}
            })
        );
        assert_eq!(msg.event_name(), "paymentReceived");
    }

    #[test]
    fn test_connected_and_pong_wire_format() {
        let connected = serde_json::to_value(WsMessage::Connected { user_id: 7 }).unwrap();
        assert_eq!(connected, json!({"event": "connected", "data": {"userId": 7}}));

        let pong = serde_json::to_value(WsMessage::Pong {}).unwrap();
        assert_eq!(pong, json!({"event": "pong", "data": {}}));
    }
}
