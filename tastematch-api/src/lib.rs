//! tastematch-api library - matching service
//!
//! Finds nearby people with shared interests or music taste and nearby venues
//! serving what a user likes.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tastematch_common::config::{AuthConfig, TomlConfig};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod matching;
pub mod pagination;
pub mod services;
pub mod sync;

use matching::MatchingEngine;
use services::MusicServiceClient;
use sync::MusicSync;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Bearer token signing secret
    pub token_secret: i64,
    pub auth: AuthConfig,
    pub matching: MatchingEngine,
    pub music_sync: MusicSync,
    pub music_client: Arc<dyn MusicServiceClient>,
    /// Artists requested per music sync
    pub top_artists_limit: u32,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        token_secret: i64,
        config: &TomlConfig,
        music_client: Arc<dyn MusicServiceClient>,
    ) -> Self {
        Self {
            matching: MatchingEngine::new(db.clone(), config.matching),
            music_sync: MusicSync::new(db.clone()),
            db,
            token_secret,
            auth: config.auth,
            music_client,
            top_artists_limit: config.spotify.top_artists_limit,
        }
    }
}

/// Build application router
///
/// `/health`, registration, token issue and the OAuth endpoints are public;
/// everything else requires a bearer access token.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/users", get(api::list_users).post(api::register))
        .route("/profiles/:id", get(api::get_profile).patch(api::update_profile))
        .route("/users/:id/matches", get(api::nearby_matches))
        .route("/users/:id/music-matches", get(api::music_matches))
        .route("/users/:id/venue-matches", get(api::venue_matches))
        .route("/spotify/sync", post(api::spotify::sync))
        .route(
            "/venues/:id",
            get(api::get_venue).patch(api::patch_venue).put(api::put_venue),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/register", post(api::register))
        .route("/token", post(api::obtain_token))
        .route("/token/refresh", post(api::refresh_token))
        .route("/spotify/login", get(api::spotify::login))
        .route("/spotify/callback", get(api::spotify::callback))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
