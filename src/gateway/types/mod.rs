//! Gateway types module
//!
//! ## Input Types
//! - [`SendPaymentRequest`]: transfer body, validated into a `TransferCommand`
//! - [`AmountInput`]: number-or-string amount with strict parsing
//!
//! ## Output Types
//! - [`SendPaymentResponse`], [`BalanceResponse`], [`HealthResponse`]
//! - [`ApiError`]: `{ "error": "..." }` with the matching status code

pub mod money;
pub mod payment;
pub mod response;

pub use money::AmountInput;
pub use payment::SendPaymentRequest;
pub use response::{
    ApiError, ApiResult, BalanceResponse, ErrorResponse, HealthResponse, SendPaymentResponse, ok,
};
