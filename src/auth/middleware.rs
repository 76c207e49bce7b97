use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{AuthenticatedUser, TokenService};
use crate::gateway::{state::AppState, types::ApiError};

pub const NO_TOKEN: &str = "Unauthorized - No Token Provided";
pub const INVALID_TOKEN: &str = "Unauthorized - Invalid Token";

const JWT_COOKIE: &str = "jwt";

/// Bearer header first, then the `jwt` cookie set by the login collaborator.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == JWT_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}

/// Resolve the caller from the request headers.
pub fn authenticate(tokens: &TokenService, headers: &HeaderMap) -> Result<AuthenticatedUser, ApiError> {
    let token = extract_token(headers).ok_or_else(|| ApiError::unauthorized(NO_TOKEN))?;
    tokens.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected token");
        ApiError::unauthorized(INVALID_TOKEN)
    })
}

pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&state.tokens, request.headers())?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
