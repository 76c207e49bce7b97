//! Response bodies and the error type every handler returns
//!
//! Success bodies are the DTOs below; failures are always `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::money::Balance;
use crate::query::QueryError;
use crate::transfer::TransferError;

// ============================================================================
// Success Bodies
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendPaymentResponse {
    #[schema(example = true)]
    pub success: bool,
    #[schema(value_type = i64, example = 30000)]
    pub sender_balance: Balance,
    #[schema(value_type = i64, example = 15000)]
    pub receiver_balance: Balance,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(value_type = i64, example = 45000)]
    pub balance: Balance,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "0.1.0+a1b2c3d")]
    pub version: String,
    #[schema(example = 3)]
    pub online_users: usize,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "Insufficient balance")]
    pub error: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(data))
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub fn into_err<T>(self) -> Result<T, ApiError> {
        Err(self)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, e.public_message())
    }
}

impl From<QueryError> for ApiError {
    fn from(e: QueryError) -> Self {
        if let QueryError::Storage(detail) = &e {
            tracing::error!(error = %detail, "Balance query failed");
        }
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, e.public_message())
    }
}
