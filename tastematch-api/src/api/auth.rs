//! Bearer authentication middleware
//!
//! Protected routes require `Authorization: Bearer <access token>`. The
//! authenticated user id is inserted into request extensions as
//! [`AuthUser`].

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tastematch_common::api::auth::{validate_token, AuthError, TokenKind};
use tracing::debug;

use crate::error::ApiError;
use crate::AppState;

/// Authenticated requester
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Raw bearer token from `headers`, if any
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Validate the access token in `headers`
pub fn authenticate(headers: &HeaderMap, secret: i64) -> Result<AuthUser, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Authentication credentials were not provided".to_string()))?;

    let claims = validate_token(token, TokenKind::Access, secret).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        match e {
            AuthError::DatabaseError(msg) => ApiError::Internal(msg),
            other => ApiError::Unauthorized(other.to_string()),
        }
    })?;

    Ok(AuthUser {
        user_id: claims.user_id,
    })
}

/// Authentication middleware for protected routes
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(request.headers(), state.token_secret)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
