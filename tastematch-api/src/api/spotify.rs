//! Spotify OAuth and sync endpoints

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Redirect,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::auth::{self, AuthUser};
use crate::db::profiles;
use crate::error::{ApiError, ApiResult};
use crate::sync::extract;
use crate::AppState;

/// GET /spotify/login
///
/// Redirects to the service's consent page.
pub async fn login(State(state): State<AppState>) -> ApiResult<Redirect> {
    let url = state.music_client.authorize_url()?;
    Ok(Redirect::temporary(&url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CallbackResponse {
    pub top_artists: Vec<String>,
}

/// GET /spotify/callback?code=
///
/// Exchanges the code, fetches top artists and, when the request carries a
/// valid bearer token, syncs them into the caller's profile.
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<Json<CallbackResponse>> {
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No code provided".to_string()))?;

    let client = state.music_client.as_ref();
    let token = client.exchange_code(&code).await?;
    let payload = client
        .top_artists(&token.access_token, state.top_artists_limit)
        .await?;
    let extracted = extract(client.service_name(), &payload)
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    if auth::bearer_token(&headers).is_some() {
        let user = auth::authenticate(&headers, state.token_secret)?;
        match profiles::load_profile_by_user(&state.db, user.user_id).await? {
            Some(profile) => {
                state
                    .music_sync
                    .sync(profile.id, client.service_name(), &payload)
                    .await?;
            }
            None => warn!(user_id = user.user_id, "No profile to sync into"),
        }
    }

    Ok(Json(CallbackResponse {
        top_artists: extracted.artists,
    }))
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub spotify_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub status: &'static str,
    pub artists_synced: usize,
    pub genres_synced: usize,
}

/// POST /spotify/sync
pub async fn sync(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<SyncRequest>,
) -> ApiResult<Json<SyncResponse>> {
    let token = request
        .spotify_token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("spotify_token is required".to_string()))?;

    let profile = profiles::load_profile_by_user(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Profile for user {}", auth.user_id)))?;

    let report = state
        .music_sync
        .fetch_and_sync(
            state.music_client.as_ref(),
            profile.id,
            token.trim(),
            state.top_artists_limit,
        )
        .await?;

    info!(user_id = auth.user_id, "Spotify sync finished");
    Ok(Json(SyncResponse {
        status: "success",
        artists_synced: report.artists_synced,
        genres_synced: report.genres_synced,
    }))
}
