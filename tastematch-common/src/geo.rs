//! Geo Index: point locations and great-circle radius queries
//!
//! Points are stored as (longitude, latitude) in decimal degrees, matching the
//! `location_input: [lon, lat]` wire format. Radius checks are inclusive.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mean Earth radius in kilometres (IUGG)
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Slack added to bounding boxes so rounding never cuts off an edge point
const BOX_MARGIN_DEG: f64 = 1e-6;

/// Geographic point (WGS84 degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    /// Create a validated point
    ///
    /// Rejects non-finite values, longitude outside [-180, 180] and latitude
    /// outside [-90, 90].
    pub fn new(longitude: f64, latitude: f64) -> Result<Self> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(Error::InvalidInput(
                "Coordinates must be finite numbers".to_string(),
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidInput(format!(
                "Longitude {} out of range [-180, 180]",
                longitude
            )));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidInput(format!(
                "Latitude {} out of range [-90, 90]",
                latitude
            )));
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Build from a `[longitude, latitude]` pair
    pub fn from_lon_lat(pair: &[f64]) -> Result<Self> {
        match pair {
            [lon, lat] => Self::new(*lon, *lat),
            _ => Err(Error::InvalidInput(format!(
                "Location must be [longitude, latitude], got {} values",
                pair.len()
            ))),
        }
    }

    /// Great-circle distance to `other` in kilometres (haversine)
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Bounding box enclosing the circle of `radius_km` around this point
    ///
    /// Used as a cheap SQL prefilter; exact filtering still goes through
    /// [`within_radius`].
    pub fn bounding_box(&self, radius_km: f64) -> BoundingBox {
        // Angular radius of the circle on the sphere used by `distance_km`
        let angular = radius_km.max(0.0) / EARTH_RADIUS_KM;
        let d_lat = angular.to_degrees() + BOX_MARGIN_DEG;

        // Widest longitude reach of the circle; a circle covering a pole
        // reaches every longitude
        let reach = angular.sin() / self.latitude.to_radians().cos();
        let d_lon = if angular >= std::f64::consts::FRAC_PI_2 || !(0.0..1.0).contains(&reach) {
            180.0
        } else {
            (reach.asin().to_degrees() + BOX_MARGIN_DEG).min(180.0)
        };

        BoundingBox {
            min_lat: (self.latitude - d_lat).max(-90.0),
            max_lat: (self.latitude + d_lat).min(90.0),
            min_lon: self.longitude - d_lon,
            max_lon: self.longitude + d_lon,
        }
    }
}

/// Latitude/longitude rectangle
///
/// `min_lon`/`max_lon` may fall outside [-180, 180] when the box crosses the
/// antimeridian; [`BoundingBox::lon_ranges`] splits it into valid ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Longitude ranges in [-180, 180] covered by this box
    pub fn lon_ranges(&self) -> Vec<(f64, f64)> {
        if self.max_lon - self.min_lon >= 360.0 {
            return vec![(-180.0, 180.0)];
        }
        if self.min_lon < -180.0 {
            vec![(self.min_lon + 360.0, 180.0), (-180.0, self.max_lon)]
        } else if self.max_lon > 180.0 {
            vec![(self.min_lon, 180.0), (-180.0, self.max_lon - 360.0)]
        } else {
            vec![(self.min_lon, self.max_lon)]
        }
    }
}

/// Anything with an optional location
pub trait Located {
    fn location(&self) -> Option<GeoPoint>;
}

/// Filter `candidates` to those within `radius_km` (inclusive) of `center`
///
/// Returns each kept candidate paired with its distance, preserving input
/// order. Candidates without a location never match.
pub fn within_radius<T: Located>(
    center: &GeoPoint,
    radius_km: f64,
    candidates: impl IntoIterator<Item = T>,
) -> Vec<(T, f64)> {
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let point = candidate.location()?;
            let distance = center.distance_km(&point);
            (distance <= radius_km).then_some((candidate, distance))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pin(Option<GeoPoint>);

    impl Located for Pin {
        fn location(&self) -> Option<GeoPoint> {
            self.0
        }
    }

    fn sf() -> GeoPoint {
        GeoPoint::new(-122.4194, 37.7749).unwrap()
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        assert_eq!(sf().distance_km(&sf()), 0.0);
    }

    #[test]
    fn test_distance_nearby_points() {
        let b = GeoPoint::new(-122.4190, 37.7745).unwrap();
        let d = sf().distance_km(&b);
        // Roughly 56 metres apart
        assert!(d > 0.04 && d < 0.07, "distance was {}", d);
    }

    #[test]
    fn test_distance_sf_to_la() {
        let la = GeoPoint::new(-118.2437, 34.0522).unwrap();
        let d = sf().distance_km(&la);
        assert!((d - 559.0).abs() < 5.0, "distance was {}", d);
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        assert!(GeoPoint::new(181.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -90.5).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::from_lon_lat(&[1.0]).is_err());
        assert!(GeoPoint::from_lon_lat(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_within_radius_inclusive_and_skips_missing() {
        let center = GeoPoint::new(0.0, 0.0).unwrap();
        let edge = GeoPoint::new(0.0, 1.0).unwrap();
        let edge_km = center.distance_km(&edge);

        let pins = vec![Pin(Some(edge)), Pin(None), Pin(Some(center))];
        let kept = within_radius(&center, edge_km, pins);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].1, edge_km);
        assert_eq!(kept[1].1, 0.0);
    }

    #[test]
    fn test_within_radius_excludes_far_points() {
        let far = GeoPoint::new(-122.4194, 37.8300).unwrap();
        let kept = within_radius(&sf(), 5.0, vec![Pin(Some(far))]);
        assert!(kept.is_empty());
    }

    fn contains(bbox: &BoundingBox, point: &GeoPoint) -> bool {
        (bbox.min_lat..=bbox.max_lat).contains(&point.latitude)
            && bbox
                .lon_ranges()
                .iter()
                .any(|(lo, hi)| (*lo..=*hi).contains(&point.longitude))
    }

    /// Point `distance_km` from `center` along initial `bearing_deg`
    fn destination(center: &GeoPoint, distance_km: f64, bearing_deg: f64) -> GeoPoint {
        let delta = distance_km / EARTH_RADIUS_KM;
        let theta = bearing_deg.to_radians();
        let phi1 = center.latitude.to_radians();
        let lambda1 = center.longitude.to_radians();

        let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
        let lambda2 = lambda1
            + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());
        GeoPoint::new(lambda2.to_degrees(), phi2.to_degrees()).unwrap()
    }

    #[test]
    fn test_bounding_box_contains_radius() {
        let bbox = sf().bounding_box(5.0);
        let north = GeoPoint::new(-122.4194, 37.7749 + 0.044).unwrap();
        assert!(sf().distance_km(&north) < 5.0);
        assert!(north.latitude <= bbox.max_lat);
        assert_eq!(bbox.lon_ranges().len(), 1);
    }

    #[test]
    fn test_bounding_box_keeps_points_near_the_edge() {
        for (lon, lat) in [(0.0, 0.0), (-122.4194, 37.7749), (10.0, 60.0), (25.0, -70.0)] {
            let center = GeoPoint::new(lon, lat).unwrap();
            for radius in [5.0, 10.0, 250.0] {
                let bbox = center.bounding_box(radius);
                for bearing in (0..360).step_by(15) {
                    let edge = destination(&center, radius * 0.999, bearing as f64);
                    assert!(center.distance_km(&edge) <= radius);
                    assert!(
                        contains(&bbox, &edge),
                        "({}, {}) r={} bearing={} left the box",
                        lon,
                        lat,
                        radius,
                        bearing
                    );
                }
            }
        }
    }

    #[test]
    fn test_bounding_box_due_north_at_equator() {
        let center = GeoPoint::new(0.0, 0.0).unwrap();
        let north = GeoPoint::new(0.0, (4.999 / EARTH_RADIUS_KM).to_degrees()).unwrap();
        assert!(center.distance_km(&north) <= 5.0);
        assert!(contains(&center.bounding_box(5.0), &north));
    }

    #[test]
    fn test_bounding_box_covering_pole_spans_all_longitudes() {
        let center = GeoPoint::new(0.0, 89.99).unwrap();
        let bbox = center.bounding_box(10.0);
        assert_eq!(bbox.max_lat, 90.0);
        assert_eq!(bbox.lon_ranges(), vec![(-180.0, 180.0)]);
    }

    #[test]
    fn test_bounding_box_wraps_antimeridian() {
        let center = GeoPoint::new(179.99, 0.0).unwrap();
        let ranges = center.bounding_box(10.0).lon_ranges();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].0, -180.0);
    }
}
