//! JWT authentication gate for the payment endpoints
//!
//! Tokens are HS256 JWTs whose `sub` is the numeric user id. They arrive as
//! `Authorization: Bearer <token>` or in the `jwt` cookie. Issuing tokens at
//! login is the account service's job.

pub mod middleware;
pub mod models;
pub mod token;

pub use middleware::jwt_auth_middleware;
pub use models::{AuthenticatedUser, Claims};
pub use token::{TokenError, TokenService};
