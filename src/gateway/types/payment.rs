//! Payment request bodies

use serde::Deserialize;
use utoipa::ToSchema;

use super::money::AmountInput;
use crate::auth::AuthenticatedUser;
use crate::core_types::UserId;
use crate::transfer::{TransferCommand, TransferError};

/// `POST /api/payments/send` body. Every field is optional at the serde
/// layer so that a missing field reports `All fields are required` rather
/// than a parser message.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendPaymentRequest {
    #[schema(example = 1)]
    pub sender_id: Option<UserId>,
    #[schema(example = 2)]
    pub receiver_id: Option<UserId>,
    /// Whole minor units, as a number or numeric string
    #[schema(value_type = Option<i64>, example = 15000)]
    pub amount: Option<AmountInput>,
    #[schema(example = "1234")]
    pub passkey: Option<String>,
    /// Optional deduplication key; repeats replay the first outcome
    #[schema(example = "7f9c2ba4-e88f-11ee-a4f1-0242ac120002")]
    pub request_id: Option<String>,
}

impl SendPaymentRequest {
    /// Validate in order: required fields, amount, self-transfer, caller.
    pub fn into_command(self, caller: AuthenticatedUser) -> Result<TransferCommand, TransferError> {
        let (Some(sender_id), Some(receiver_id), Some(amount), Some(passkey)) =
            (self.sender_id, self.receiver_id, self.amount, self.passkey)
        else {
            return Err(TransferError::MissingFields);
        };
        if passkey.is_empty() {
            return Err(TransferError::MissingFields);
        }

        let amount = amount.to_amount()?;

        if sender_id == receiver_id {
            return Err(TransferError::SelfTransfer);
        }
        if sender_id != caller.user_id {
            return Err(TransferError::SenderMismatch);
        }

        let cmd = TransferCommand::new(sender_id, receiver_id, amount, passkey);
        Ok(match self.request_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => cmd.with_request_id(id),
            None => cmd,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: AuthenticatedUser = AuthenticatedUser { user_id: 1 };

    fn req(json: serde_json::Value) -> SendPaymentRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_valid_request() {
        let cmd = req(serde_json::json!({
            "senderId": 1, "receiverId": 2, "amount": 15000, "passkey": "1234", "requestId": "r-1"
        }))
        .into_command(ALICE)
        .unwrap();
        assert_eq!(cmd.sender_id, 1);
        assert_eq!(cmd.receiver_id, 2);
        assert_eq!(cmd.amount.minor_units(), 15_000);
        assert_eq!(cmd.passkey, "1234");
        assert_eq!(cmd.request_id.as_deref(), Some("r-1"));
    }

    #[test]
    fn test_missing_fields() {
        for body in [
            serde_json::json!({"receiverId": 2, "amount": 10, "passkey": "1234"}),
            serde_json::json!({"senderId": 1, "amount": 10, "passkey": "1234"}),
            serde_json::json!({"senderId": 1, "receiverId": 2, "passkey": "1234"}),
            serde_json::json!({"senderId": 1, "receiverId": 2, "amount": 10}),
            serde_json::json!({"senderId": 1, "receiverId": 2, "amount": 10, "passkey": ""}),
            serde_json::json!({"senderId": 1, "receiverId": 2, "amount": null, "passkey": "1234"}),
        ] {
            assert_eq!(
                req(body.clone()).into_command(ALICE).unwrap_err(),
                TransferError::MissingFields,
                "{body}"
            );
        }
    }

    #[test]
    fn test_amount_checked_before_self_transfer() {
        let err = req(serde_json::json!({
            "senderId": 1, "receiverId": 1, "amount": 0, "passkey": "1234"
        }))
        .into_command(ALICE)
        .unwrap_err();
        assert_eq!(err, TransferError::InvalidAmount);
        assert_eq!(err.to_string(), "Amount must be greater than 0");
    }

    #[test]
    fn test_self_transfer() {
        let err = req(serde_json::json!({
            "senderId": 1, "receiverId": 1, "amount": 5, "passkey": "1234"
        }))
        .into_command(ALICE)
        .unwrap_err();
        assert_eq!(err, TransferError::SelfTransfer);
    }

    #[test]
    fn test_sender_must_be_caller() {
        let err = req(serde_json::json!({
            "senderId": 2, "receiverId": 3, "amount": 5, "passkey": "1234"
        }))
        .into_command(ALICE)
        .unwrap_err();
        assert_eq!(err, TransferError::SenderMismatch);
    }

    #[test]
    fn test_blank_request_id_ignored() {
        let cmd = req(serde_json::json!({
            "senderId": 1, "receiverId": 2, "amount": "7", "passkey": "1234", "requestId": "  "
        }))
        .into_command(ALICE)
        .unwrap();
        assert!(cmd.request_id.is_none());
    }
}
