//! Venue ranking against food and drink preferences

use serde::Serialize;
use std::cmp::Reverse;
use tastematch_common::db::{Profile, Venue};
use tastematch_common::geo::{within_radius, GeoPoint};
use tastematch_common::overlap::{distinct_hits, overlap_count};

/// Per-dimension overlap between a venue menu and a profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MenuOverlap {
    pub matched_dishes: usize,
    pub matched_drinks: usize,
    pub matched_dish_categories: usize,
    pub matched_drink_categories: usize,
}

impl MenuOverlap {
    pub fn between(profile: &Profile, venue: &Venue) -> Self {
        Self {
            matched_dishes: overlap_count(&profile.favorite_dishes, &venue.dishes),
            matched_drinks: overlap_count(&profile.favorite_drinks, &venue.drinks),
            matched_dish_categories: distinct_hits(
                &venue.dish_categories,
                &profile.preferred_dish_categories,
            ),
            matched_drink_categories: distinct_hits(
                &venue.drink_categories,
                &profile.preferred_drink_categories,
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct VenueMatch {
    pub venue: Venue,
    pub distance_km: f64,
    pub overlap: MenuOverlap,
}

/// Rank venues within `radius_km` by dishes, drinks, dish categories and
/// drink categories, in that priority
///
/// Field order of [`MenuOverlap`] is the ranking order. Venues with no
/// overlap at all are dropped; ties go to the closer venue, then lower id.
pub fn rank_venues(
    requester: &Profile,
    center: &GeoPoint,
    radius_km: f64,
    venues: Vec<Venue>,
) -> Vec<VenueMatch> {
    let mut matches: Vec<VenueMatch> = within_radius(center, radius_km, venues)
        .into_iter()
        .filter_map(|(venue, distance_km)| {
            let overlap = MenuOverlap::between(requester, &venue);
            (!overlap.is_empty()).then_some(VenueMatch {
                venue,
                distance_km,
                overlap,
            })
        })
        .collect();

    matches.sort_by(|a, b| {
        Reverse(a.overlap)
            .cmp(&Reverse(b.overlap))
            .then(a.distance_km.total_cmp(&b.distance_km))
            .then(a.venue.id.cmp(&b.venue.id))
    });
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tastematch_common::db::VenueType;

    fn venue(id: i64, lat: f64, dishes: &[(i64, i64)], drinks: &[(i64, i64)]) -> Venue {
        Venue {
            id,
            name: format!("venue-{}", id),
            venue_type: VenueType::Restaurant,
            location: GeoPoint::new(0.0, lat).unwrap(),
            address: String::new(),
            description: String::new(),
            is_active: true,
            average_price: None,
            dishes: dishes.iter().map(|(d, _)| *d).collect(),
            drinks: drinks.iter().map(|(d, _)| *d).collect(),
            music_genres: HashSet::new(),
            dish_categories: dishes.iter().map(|(_, c)| *c).collect(),
            drink_categories: drinks.iter().map(|(_, c)| *c).collect(),
        }
    }

    fn diner() -> Profile {
        Profile {
            id: 1,
            user_id: 1,
            location: Some(GeoPoint::new(0.0, 0.0).unwrap()),
            favorite_dishes: [100].into_iter().collect(),
            favorite_drinks: [200].into_iter().collect(),
            preferred_dish_categories: [7].into_iter().collect(),
            preferred_drink_categories: [8].into_iter().collect(),
            ..Profile::default()
        }
    }

    #[test]
    fn test_zero_overlap_venues_never_appear() {
        let me = diner();
        let center = me.location.unwrap();
        let unrelated = venue(1, 0.001, &[(555, 55)], &[(666, 66)]);
        let empty = venue(2, 0.001, &[], &[]);

        assert!(rank_venues(&me, &center, 10.0, vec![unrelated, empty]).is_empty());
    }

    #[test]
    fn test_priority_order() {
        let me = diner();
        let center = me.location.unwrap();
        let category_only = venue(1, 0.001, &[(101, 7), (102, 7)], &[]);
        let drink_only = venue(2, 0.002, &[], &[(200, 9)]);
        let dish_only = venue(3, 0.05, &[(100, 3)], &[]);
        let drink_category = venue(4, 0.001, &[], &[(201, 8)]);

        let found = rank_venues(
            &me,
            &center,
            10.0,
            vec![category_only, drink_only, dish_only, drink_category],
        );
        let order: Vec<i64> = found.iter().map(|m| m.venue.id).collect();
        assert_eq!(order, vec![3, 2, 1, 4]);
        // Two dishes in the same category count once
        assert_eq!(found[2].overlap.matched_dish_categories, 1);
    }

    #[test]
    fn test_outside_radius_is_dropped() {
        let me = diner();
        let center = me.location.unwrap();
        // ~11 km north
        let far = venue(1, 0.1, &[(100, 7)], &[]);
        assert!(rank_venues(&me, &center, 10.0, vec![far]).is_empty());
    }
}
