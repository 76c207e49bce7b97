//! Payment handlers: send a payment, read a balance

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, BalanceResponse, ErrorResponse, SendPaymentRequest, SendPaymentResponse,
    ok,
};
use crate::auth::AuthenticatedUser;
use crate::core_types::UserId;

/// Send a payment to another user
///
/// POST /api/payments/send
#[utoipa::path(
    post,
    path = "/api/payments/send",
    request_body = SendPaymentRequest,
    responses(
        (status = 200, description = "Payment committed", body = SendPaymentResponse),
        (status = 400, description = "Invalid request, wrong passkey or insufficient balance", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Sender or receiver not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Payments"
)]
pub async fn send_payment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthenticatedUser>,
    body: Result<Json<SendPaymentRequest>, JsonRejection>,
) -> ApiResult<SendPaymentResponse> {
    let Json(req) = body.map_err(|rejection| {
        tracing::debug!(user_id = user.user_id, error = %rejection.body_text(), "Malformed payment body");
        ApiError::bad_request(rejection.body_text())
    })?;

    let cmd = req.into_command(user)?;
    let outcome = state.engine.transfer(cmd).await?;

    ok(SendPaymentResponse {
        success: true,
        sender_balance: outcome.sender_balance,
        receiver_balance: outcome.receiver_balance,
    })
}

/// Current balance of a user
///
/// GET /api/payments/balance/{userId}
#[utoipa::path(
    get,
    path = "/api/payments/balance/{userId}",
    params(
        ("userId" = i64, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
        (status = 400, description = "User id is not a number", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("jwt" = [])),
    tag = "Payments"
)]
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    path: Result<Path<UserId>, PathRejection>,
) -> ApiResult<BalanceResponse> {
    let Path(user_id) = path.map_err(|_| ApiError::bad_request("Invalid user id"))?;
    let balance = state.balances.get_balance(user_id).await?;
    ok(BalanceResponse { balance })
}
