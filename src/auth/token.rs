use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use super::models::{AuthenticatedUser, Claims};
use crate::core_types::UserId;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token rejected: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Token subject is not a user id")]
    BadSubject,

    #[error("Token lifetime out of range")]
    BadLifetime,
}

/// HS256 keys derived from the shared secret
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Issue a token for `user_id`. The registration/login collaborator owns
    /// this in production; the server uses it for tests and tooling.
    pub fn issue(&self, user_id: UserId, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let expiration = now.checked_add_signed(ttl).ok_or(TokenError::BadLifetime)?;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: usize::try_from(expiration.timestamp()).map_err(|_| TokenError::BadLifetime)?,
            iat: usize::try_from(now.timestamp()).map_err(|_| TokenError::BadLifetime)?,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verify JWT token
    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        AuthenticatedUser::try_from(&token_data.claims).map_err(|_| TokenError::BadSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let tokens = TokenService::new("secret");
        let token = tokens.issue(42, Duration::hours(1)).unwrap();
        assert_eq!(tokens.verify(&token).unwrap().user_id, 42);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = TokenService::new("a").issue(42, Duration::hours(1)).unwrap();
        assert!(matches!(
            TokenService::new("b").verify(&token),
            Err(TokenError::Jwt(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new("secret");
        // Past the default 60s leeway
        let token = tokens.issue(42, Duration::minutes(-5)).unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let claims = Claims {
            sub: "alice".into(),
            exp: (Utc::now().timestamp() + 3600) as usize,
            iat: Utc::now().timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(matches!(
            TokenService::new("secret").verify(&token),
            Err(TokenError::BadSubject)
        ));
    }
}
