//! Token claims and the identity injected into authenticated requests.

use serde::{Deserialize, Serialize};

use crate::core_types::UserId;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // Subject (user_id as string)
    pub exp: usize,  // Expiration time (as UTC timestamp)
    pub iat: usize,  // Issued at
}

/// Caller identity, available to handlers as `Extension<AuthenticatedUser>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

impl TryFrom<&Claims> for AuthenticatedUser {
    type Error = std::num::ParseIntError;

    fn try_from(claims: &Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: claims.sub.parse()?,
        })
    }
}
