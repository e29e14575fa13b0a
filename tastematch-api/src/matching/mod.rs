//! Matching engine
//!
//! Every operation works the same way: the store returns candidates inside a
//! bounding box around the requester, then the pure ranking functions apply
//! the exact radius, visibility rules and overlap counts. A requester without
//! a location gets no matches.

pub mod music;
pub mod nearby;
pub mod venues;

pub use music::{rank_music, MusicMatch};
pub use nearby::{rank_nearby, ProfileMatch};
pub use venues::{rank_venues, MenuOverlap, VenueMatch};

use sqlx::SqlitePool;
use tastematch_common::config::MatchingConfig;
use tastematch_common::db::Profile;
use tracing::debug;

use crate::db::profiles::{profiles_near, ProfileSet};
use crate::db::venues::venues_near;

/// Ranks profiles and venues for a requester using configured radii
#[derive(Clone)]
pub struct MatchingEngine {
    db: SqlitePool,
    config: MatchingConfig,
}

impl MatchingEngine {
    pub fn new(db: SqlitePool, config: MatchingConfig) -> Self {
        Self { db, config }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Profiles nearby that share an interest with `requester`
    pub async fn nearby_matches(&self, requester: &Profile) -> sqlx::Result<Vec<ProfileMatch>> {
        let Some(center) = requester.location else {
            return Ok(Vec::new());
        };
        let radius = self.config.user_radius_km;

        let candidates = profiles_near(&self.db, &center, radius, &[ProfileSet::Interests]).await?;
        debug!(profile_id = requester.id, candidates = candidates.len(), "Nearby match candidates");

        Ok(rank_nearby(requester, &center, radius, candidates))
    }

    /// Profiles nearby sharing artists or genres, best overlap first
    pub async fn music_matches(&self, requester: &Profile) -> sqlx::Result<Vec<MusicMatch>> {
        let Some(center) = requester.location else {
            return Ok(Vec::new());
        };
        let radius = self.config.user_radius_km;

        let candidates = profiles_near(
            &self.db,
            &center,
            radius,
            &[ProfileSet::Artists, ProfileSet::Genres],
        )
        .await?;
        debug!(profile_id = requester.id, candidates = candidates.len(), "Music match candidates");

        Ok(rank_music(requester, &center, radius, candidates))
    }

    /// Venues nearby whose menu overlaps the requester's preferences
    pub async fn venue_matches(&self, requester: &Profile) -> sqlx::Result<Vec<VenueMatch>> {
        let Some(center) = requester.location else {
            return Ok(Vec::new());
        };
        let radius = self.config.venue_radius_km;

        let candidates = venues_near(&self.db, &center, radius).await?;
        debug!(profile_id = requester.id, candidates = candidates.len(), "Venue match candidates");

        Ok(rank_venues(requester, &center, radius, candidates))
    }
}
