//! Shared fixtures for tastematch-api integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tastematch_api::db::profiles::{self, ProfileSet, ProfileUpdate};
use tastematch_api::db::users::{create_user_with_profile, NewUser};
use tastematch_api::services::{MusicClientError, MusicServiceClient, OAuthToken};
use tastematch_api::{build_router, AppState};
use tastematch_common::api::auth::{issue_token, TokenKind};
use tastematch_common::config::TomlConfig;
use tastematch_common::db::{init_memory_database, Profile};
use tastematch_common::geo::GeoPoint;
use tower::util::ServiceExt;

pub const SECRET: i64 = 31337;

pub const SF_A: (f64, f64) = (-122.4194, 37.7749);
pub const SF_B: (f64, f64) = (-122.4190, 37.7745);
/// Oakland, well beyond 5 km from SF_A
pub const OAKLAND: (f64, f64) = (-122.2711, 37.8044);

/// Music client returning a canned payload or failure
pub struct StubMusicClient {
    pub payload: Value,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubMusicClient {
    pub fn returning(payload: Value) -> Self {
        Self {
            payload,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            payload: Value::Null,
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MusicServiceClient for StubMusicClient {
    fn service_name(&self) -> &'static str {
        "spotify"
    }

    fn authorize_url(&self) -> Result<String, MusicClientError> {
        Ok("https://accounts.example.com/authorize?scope=user-top-read".to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<OAuthToken, MusicClientError> {
        if self.fail {
            return Err(MusicClientError::ApiError(400, "invalid_grant".to_string()));
        }
        Ok(OAuthToken {
            access_token: format!("token-for-{}", code),
            refresh_token: None,
            expires_in: Some(3600),
        })
    }

    async fn top_artists(&self, _access_token: &str, _limit: u32) -> Result<Value, MusicClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(MusicClientError::Timeout);
        }
        Ok(self.payload.clone())
    }
}

pub fn beatles_payload() -> Value {
    serde_json::json!({
        "items": [
            {"name": "The Beatles", "genres": ["rock", "pop"]},
            {"name": "Pink Floyd", "genres": ["rock"]}
        ]
    })
}

pub async fn test_db() -> SqlitePool {
    init_memory_database().await.expect("in-memory database")
}

pub fn app_with_client(db: SqlitePool, client: Arc<dyn MusicServiceClient>) -> Router {
    build_router(AppState::new(db, SECRET, &TomlConfig::default(), client))
}

pub fn app(db: SqlitePool) -> Router {
    app_with_client(db, Arc::new(StubMusicClient::returning(beatles_payload())))
}

pub async fn create_user(db: &SqlitePool, username: &str) -> i64 {
    create_user_with_profile(
        db,
        &NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "testpass123".to_string(),
            first_name: String::new(),
            last_name: String::new(),
        },
    )
    .await
    .expect("create user")
    .id
}

pub async fn profile_of(db: &SqlitePool, user_id: i64) -> Profile {
    profiles::load_profile_by_user(db, user_id)
        .await
        .unwrap()
        .expect("profile exists")
}

pub async fn place(db: &SqlitePool, user_id: i64, (lon, lat): (f64, f64)) {
    let profile = profile_of(db, user_id).await;
    let update = ProfileUpdate {
        location: Some(GeoPoint::new(lon, lat).unwrap()),
        ..Default::default()
    };
    profiles::update_profile(db, profile.id, &update).await.unwrap();
}

pub async fn set_ids(db: &SqlitePool, user_id: i64, set: ProfileSet, ids: &[i64]) {
    let profile = profile_of(db, user_id).await;
    let update = ProfileUpdate {
        sets: vec![(set, ids.iter().copied().collect())],
        ..Default::default()
    };
    profiles::update_profile(db, profile.id, &update).await.unwrap();
}

/// Insert named catalog rows, returning their ids in order
pub async fn seed_names(db: &SqlitePool, table: &str, names: &[&str]) -> Vec<i64> {
    let mut ids = Vec::new();
    for name in names {
        let id: i64 = sqlx::query_scalar(&format!(
            "INSERT INTO {} (name) VALUES (?) RETURNING id",
            table
        ))
        .bind(name)
        .fetch_one(db)
        .await
        .unwrap();
        ids.push(id);
    }
    ids
}

pub fn access_token(user_id: i64) -> String {
    issue_token(TokenKind::Access, user_id, 900, SECRET)
}

pub fn request(method: &str, uri: &str, user_id: Option<i64>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("Authorization", format!("Bearer {}", access_token(user_id)));
    }
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Extract JSON body from response
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
