//! Additive merge of extracted names into a profile

use sqlx::SqlitePool;
use tastematch_common::db::StreamingService;
use tracing::debug;

use super::extract::Extracted;
use crate::db::catalog::{self, Catalog};
use crate::db::profiles::{self, ProfileSet};

/// Counts of newly created rows during one merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub artists_created: usize,
    pub genres_created: usize,
    pub links_added: usize,
}

/// Link every extracted artist and genre to `profile_id` in one transaction
///
/// Existing associations are kept. Catalog rows are get-or-created by name.
/// Also records `service` as the profile's streaming service.
pub async fn merge_into_profile(
    pool: &SqlitePool,
    profile_id: i64,
    service: StreamingService,
    extracted: &Extracted,
) -> sqlx::Result<MergeStats> {
    let mut stats = MergeStats::default();
    let mut tx = pool.begin().await?;

    let groups = [
        (Catalog::Artists, ProfileSet::Artists, &extracted.artists),
        (Catalog::MusicGenres, ProfileSet::Genres, &extracted.genres),
    ];
    for (kind, set, names) in groups {
        let (table, column) = set.link();
        for name in names {
            let (id, created) = catalog::get_or_create(&mut tx, kind, name).await?;
            if created {
                match kind {
                    Catalog::Artists => stats.artists_created += 1,
                    _ => stats.genres_created += 1,
                }
            }
            if catalog::link(&mut tx, table, "profile_id", column, profile_id, id).await? {
                stats.links_added += 1;
            }
        }
    }

    profiles::set_streaming_service(&mut tx, profile_id, service).await?;
    profiles::touch(&mut tx, profile_id).await?;
    tx.commit().await?;

    debug!(profile_id, ?stats, "Merged music taste");
    Ok(stats)
}
