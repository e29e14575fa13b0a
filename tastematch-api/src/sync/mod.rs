//! Music sync adapter
//!
//! Imports a user's top artists from a streaming service into their profile:
//!
//! ```text
//! Idle → Fetching → Normalizing → Merging → Idle
//! ```
//!
//! Fetching is the only network call and runs without any lock. Merging
//! holds the profile's lock and commits in a single transaction, so a failed
//! fetch or a rejected payload leaves the profile untouched.

pub mod extract;
pub mod locks;
pub mod merge;

pub use extract::{extract, normalize_name, Extracted};
pub use locks::ProfileLocks;
pub use merge::{merge_into_profile, MergeStats};

use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use std::fmt;
use tastematch_common::db::StreamingService;
use thiserror::Error;
use tracing::{debug, info};

use crate::services::{MusicClientError, MusicServiceClient};

/// Sync failures; item-level problems never surface here
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Music service call failed: {0}")]
    Upstream(#[from] MusicClientError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Sync adapter phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Normalizing,
    Merging,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Idle => "idle",
            SyncPhase::Fetching => "fetching",
            SyncPhase::Normalizing => "normalizing",
            SyncPhase::Merging => "merging",
        };
        f.write_str(name)
    }
}

/// Outcome of one sync
///
/// `artists_synced` counts every artist name extracted by this call, not
/// only new ones; `genres_synced` counts distinct genres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub artists_synced: usize,
    pub genres_synced: usize,
}

/// Streaming service stored for a service name; unknown names map to `Other`
pub fn streaming_service_for(service: &str) -> StreamingService {
    service.parse().unwrap_or(StreamingService::Other)
}

/// Music sync adapter over the profile store
#[derive(Clone)]
pub struct MusicSync {
    db: SqlitePool,
    locks: ProfileLocks,
}

impl MusicSync {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            locks: ProfileLocks::new(),
        }
    }

    /// Normalize `payload` from `service` and merge it into `profile_id`
    pub async fn sync(
        &self,
        profile_id: i64,
        service: &str,
        payload: &Value,
    ) -> Result<SyncReport, SyncError> {
        debug!(profile_id, service, phase = %SyncPhase::Normalizing, "Music sync");
        let extracted = extract(service, payload)?;
        let report = SyncReport {
            artists_synced: extracted.artists.len(),
            genres_synced: extracted.genres.len(),
        };

        debug!(profile_id, service, phase = %SyncPhase::Merging, "Music sync");
        {
            let _guard = self.locks.acquire(profile_id).await;
            merge_into_profile(&self.db, profile_id, streaming_service_for(service), &extracted)
                .await?;
        }

        info!(
            profile_id,
            service,
            artists = report.artists_synced,
            genres = report.genres_synced,
            "Music sync complete"
        );
        debug!(profile_id, phase = %SyncPhase::Idle, "Music sync");
        Ok(report)
    }

    /// Fetch top artists with `access_token`, then sync them
    pub async fn fetch_and_sync(
        &self,
        client: &dyn MusicServiceClient,
        profile_id: i64,
        access_token: &str,
        limit: u32,
    ) -> Result<SyncReport, SyncError> {
        debug!(profile_id, service = client.service_name(), phase = %SyncPhase::Fetching, "Music sync");
        let payload = client.top_artists(access_token, limit).await?;
        if !payload.is_object() {
            return Err(MusicClientError::ParseError(
                "top artists response is not a JSON object".to_string(),
            )
            .into());
        }
        self.sync(profile_id, client.service_name(), &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_service_for() {
        assert_eq!(streaming_service_for("spotify"), StreamingService::Spotify);
        assert_eq!(streaming_service_for("apple_music"), StreamingService::AppleMusic);
        assert_eq!(streaming_service_for("deezer"), StreamingService::Other);
    }
}
