//! Match endpoints
//!
//! A requester may only ask for their own matches. Asking for someone else's,
//! or having no profile, yields an empty list rather than an error so the
//! response never reveals whether the other user exists.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use tastematch_common::db::Profile;
use tracing::debug;

use super::auth::AuthUser;
use super::views::{MusicMatchView, NearbyMatchView, VenueMatchView};
use crate::db::{profiles, users};
use crate::error::ApiResult;
use crate::pagination::page_of;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

async fn requester_profile(
    state: &AppState,
    auth: AuthUser,
    user_id: i64,
) -> ApiResult<Option<Profile>> {
    if auth.user_id != user_id {
        debug!(requester = auth.user_id, user_id, "Match request for another user");
        return Ok(None);
    }
    Ok(profiles::load_profile_by_user(&state.db, user_id).await?)
}

async fn usernames(state: &AppState, user_ids: &[i64]) -> ApiResult<HashMap<i64, String>> {
    Ok(users::usernames_for(&state.db, user_ids).await?)
}

/// GET /users/:id/matches
pub async fn nearby_matches(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<NearbyMatchView>>> {
    let Some(profile) = requester_profile(&state, auth, user_id).await? else {
        return Ok(Json(Vec::new()));
    };

    let matches = page_of(state.matching.nearby_matches(&profile).await?, query.page);
    let ids: Vec<i64> = matches.iter().map(|m| m.profile.user_id).collect();
    let mut names = usernames(&state, &ids).await?;
    let views = matches
        .iter()
        .map(|m| NearbyMatchView::new(m, names.remove(&m.profile.user_id).unwrap_or_default()))
        .collect();
    Ok(Json(views))
}

/// GET /users/:id/music-matches
pub async fn music_matches(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<MusicMatchView>>> {
    let Some(profile) = requester_profile(&state, auth, user_id).await? else {
        return Ok(Json(Vec::new()));
    };

    let matches = page_of(state.matching.music_matches(&profile).await?, query.page);
    let ids: Vec<i64> = matches.iter().map(|m| m.profile.user_id).collect();
    let mut names = usernames(&state, &ids).await?;
    let views = matches
        .iter()
        .map(|m| MusicMatchView::new(m, names.remove(&m.profile.user_id).unwrap_or_default()))
        .collect();
    Ok(Json(views))
}

/// GET /users/:id/venue-matches
pub async fn venue_matches(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<VenueMatchView>>> {
    let Some(profile) = requester_profile(&state, auth, user_id).await? else {
        return Ok(Json(Vec::new()));
    };

    let matches = page_of(state.matching.venue_matches(&profile).await?, query.page);
    let mut views = Vec::with_capacity(matches.len());
    for m in &matches {
        views.push(VenueMatchView::load(&state.db, m).await?);
    }
    Ok(Json(views))
}
