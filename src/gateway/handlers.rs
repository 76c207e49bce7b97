//! HTTP handlers, grouped by resource

pub mod health;
pub mod payment;

pub use health::health_check;
pub use payment::{get_balance, send_payment};
