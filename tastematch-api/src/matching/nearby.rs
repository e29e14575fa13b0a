//! Nearby-by-interest ranking

use std::collections::HashSet;
use tastematch_common::db::Profile;
use tastematch_common::geo::{within_radius, GeoPoint};
use tastematch_common::overlap_count;

/// A nearby profile sharing at least one interest with the requester
#[derive(Debug, Clone)]
pub struct ProfileMatch {
    pub profile: Profile,
    pub distance_km: f64,
    pub shared_interests: usize,
}

/// Rank `candidates` around `requester`
///
/// Keeps profiles within `radius_km` whose visibility allows interest
/// discovery and that share an interest. The requester and duplicate
/// candidates are dropped. Ordered by distance, then user id.
pub fn rank_nearby(
    requester: &Profile,
    center: &GeoPoint,
    radius_km: f64,
    candidates: Vec<Profile>,
) -> Vec<ProfileMatch> {
    let mut seen = HashSet::new();
    let eligible = candidates.into_iter().filter(|candidate| {
        candidate.id != requester.id
            && candidate.visibility.discoverable_by_interest()
            && seen.insert(candidate.id)
    });

    let mut matches: Vec<ProfileMatch> = within_radius(center, radius_km, eligible)
        .into_iter()
        .filter_map(|(profile, distance_km)| {
            let shared_interests = overlap_count(&requester.interests, &profile.interests);
            (shared_interests > 0).then_some(ProfileMatch {
                profile,
                distance_km,
                shared_interests,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then(a.profile.user_id.cmp(&b.profile.user_id))
    });
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use tastematch_common::db::Visibility;

    fn profile(id: i64, lon: f64, lat: f64, interests: &[i64]) -> Profile {
        Profile {
            id,
            user_id: id,
            location: Some(GeoPoint::new(lon, lat).unwrap()),
            interests: interests.iter().copied().collect(),
            ..Profile::default()
        }
    }

    fn ids(matches: &[ProfileMatch]) -> Vec<i64> {
        matches.iter().map(|m| m.profile.id).collect()
    }

    #[test]
    fn test_excludes_requester_and_duplicates() {
        let me = profile(1, -122.4194, 37.7749, &[1, 2]);
        let other = profile(2, -122.4190, 37.7745, &[1]);
        let center = me.location.unwrap();

        let found = rank_nearby(&me, &center, 5.0, vec![me.clone(), other.clone(), other]);
        assert_eq!(ids(&found), vec![2]);
        assert_eq!(found[0].shared_interests, 1);
    }

    #[test]
    fn test_visibility_and_shared_interest_required() {
        let me = profile(1, -122.4194, 37.7749, &[1]);
        let mut friends_only = profile(2, -122.4190, 37.7745, &[1]);
        friends_only.visibility = Visibility::Friends;
        let mut by_interest = profile(3, -122.4190, 37.7745, &[1]);
        by_interest.visibility = Visibility::Interests;
        let unrelated = profile(4, -122.4190, 37.7745, &[9]);
        let center = me.location.unwrap();

        let found = rank_nearby(&me, &center, 5.0, vec![friends_only, by_interest, unrelated]);
        assert_eq!(ids(&found), vec![3]);
    }

    #[test]
    fn test_ordered_by_distance_then_user() {
        let me = profile(1, 0.0, 0.0, &[1]);
        let far = profile(2, 0.03, 0.0, &[1]);
        let near_b = profile(4, 0.01, 0.0, &[1]);
        let near_a = profile(3, 0.0, 0.01, &[1]);
        let center = me.location.unwrap();

        let found = rank_nearby(&me, &center, 5.0, vec![far, near_b, near_a]);
        assert_eq!(ids(&found), vec![3, 4, 2]);
    }
}
