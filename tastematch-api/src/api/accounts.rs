//! Registration and token endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tastematch_common::api::auth::{issue_token, validate_token, AuthError, TokenKind};
use tracing::info;

use super::views::UserView;
use crate::db::users::{self, NewUser};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl RegisterRequest {
    fn validate(&self) -> ApiResult<()> {
        if self.username.trim().is_empty() {
            return Err(ApiError::BadRequest("username is required".to_string()));
        }
        if self.password.is_empty() {
            return Err(ApiError::BadRequest("password is required".to_string()));
        }
        let email = self.email.trim();
        let valid_email = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !valid_email {
            return Err(ApiError::BadRequest("Enter a valid email address".to_string()));
        }
        Ok(())
    }
}

/// POST /register
///
/// Creates the user and its empty profile.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    request.validate()?;

    let username = request.username.trim();
    let email = request.email.trim();
    if let Some(reason) = users::identity_taken(&state.db, username, email).await? {
        return Err(ApiError::Conflict(reason.to_string()));
    }

    let user = users::create_user_with_profile(
        &state.db,
        &NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
        },
    )
    .await?;

    info!(user_id = user.id, username = %user.username, "Registered user");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// POST /token
pub async fn obtain_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> ApiResult<Json<TokenPair>> {
    let user = users::authenticate(&state.db, &request.username, &request.password)
        .await?
        .ok_or_else(|| {
            ApiError::Unauthorized("No active account found with the given credentials".to_string())
        })?;

    Ok(Json(TokenPair {
        access: issue_token(TokenKind::Access, user.id, state.auth.access_ttl_secs, state.token_secret),
        refresh: issue_token(TokenKind::Refresh, user.id, state.auth.refresh_ttl_secs, state.token_secret),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

/// POST /token/refresh
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<Json<AccessToken>> {
    let claims = validate_token(&request.refresh, TokenKind::Refresh, state.token_secret)
        .map_err(|e| match e {
            AuthError::DatabaseError(msg) => ApiError::Internal(msg),
            other => ApiError::Unauthorized(other.to_string()),
        })?;

    if users::find_user(&state.db, claims.user_id).await?.is_none() {
        return Err(ApiError::Unauthorized("User not found".to_string()));
    }

    Ok(Json(AccessToken {
        access: issue_token(
            TokenKind::Access,
            claims.user_id,
            state.auth.access_ttl_secs,
            state.token_secret,
        ),
    }))
}
