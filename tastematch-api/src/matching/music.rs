//! Music-taste ranking

use std::cmp::Reverse;
use std::collections::HashSet;
use tastematch_common::db::Profile;
use tastematch_common::geo::{within_radius, GeoPoint};
use tastematch_common::overlap_count;

/// A nearby profile sharing artists or genres with the requester
#[derive(Debug, Clone)]
pub struct MusicMatch {
    pub profile: Profile,
    pub distance_km: f64,
    pub shared_artists: usize,
    pub shared_genres: usize,
}

/// Rank `candidates` by shared artists, then shared genres
///
/// Closed profiles are never returned. Remaining ties go to the closer
/// profile, then the lower user id.
pub fn rank_music(
    requester: &Profile,
    center: &GeoPoint,
    radius_km: f64,
    candidates: Vec<Profile>,
) -> Vec<MusicMatch> {
    let mut seen = HashSet::new();
    let eligible = candidates.into_iter().filter(|candidate| {
        candidate.id != requester.id
            && candidate.visibility.discoverable_by_music()
            && seen.insert(candidate.id)
    });

    let mut matches: Vec<MusicMatch> = within_radius(center, radius_km, eligible)
        .into_iter()
        .filter_map(|(profile, distance_km)| {
            let shared_artists = overlap_count(&requester.artists, &profile.artists);
            let shared_genres = overlap_count(&requester.genres, &profile.genres);
            (shared_artists > 0 || shared_genres > 0).then_some(MusicMatch {
                profile,
                distance_km,
                shared_artists,
                shared_genres,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        (Reverse(a.shared_artists), Reverse(a.shared_genres))
            .cmp(&(Reverse(b.shared_artists), Reverse(b.shared_genres)))
            .then(a.distance_km.total_cmp(&b.distance_km))
            .then(a.profile.user_id.cmp(&b.profile.user_id))
    });
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use tastematch_common::db::Visibility;

    fn listener(id: i64, lat: f64, artists: &[i64], genres: &[i64]) -> Profile {
        Profile {
            id,
            user_id: id,
            location: Some(GeoPoint::new(0.0, lat).unwrap()),
            artists: artists.iter().copied().collect(),
            genres: genres.iter().copied().collect(),
            ..Profile::default()
        }
    }

    #[test]
    fn test_artists_outrank_genres() {
        let me = listener(1, 0.0, &[10, 11], &[1, 2, 3]);
        let genre_fan = listener(2, 0.001, &[], &[1, 2, 3]);
        let artist_fan = listener(3, 0.02, &[10], &[]);
        let both = listener(4, 0.03, &[10, 11], &[1]);
        let center = me.location.unwrap();

        let found = rank_music(&me, &center, 5.0, vec![genre_fan, artist_fan, both]);
        let order: Vec<i64> = found.iter().map(|m| m.profile.id).collect();
        assert_eq!(order, vec![4, 3, 2]);
        assert_eq!((found[0].shared_artists, found[0].shared_genres), (2, 1));
    }

    #[test]
    fn test_no_overlap_and_closed_are_dropped() {
        let me = listener(1, 0.0, &[10], &[1]);
        let stranger = listener(2, 0.001, &[99], &[9]);
        let mut closed = listener(3, 0.001, &[10], &[1]);
        closed.visibility = Visibility::Closed;
        let mut friends = listener(4, 0.001, &[10], &[]);
        friends.visibility = Visibility::Friends;
        let center = me.location.unwrap();

        let found = rank_music(&me, &center, 5.0, vec![me.clone(), stranger, closed, friends]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].profile.id, 4);
    }
}
