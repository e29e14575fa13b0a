//! Store access layer for tastematch-api
//!
//! Radius queries run in two steps: a latitude/longitude bounding-box
//! prefilter in SQL (see [`BoxFilter`]), then exact great-circle filtering in
//! the matching engine.

pub mod catalog;
pub mod profiles;
pub mod users;
pub mod venues;

use tastematch_common::geo::GeoPoint;

/// Bounding-box predicate bound as six parameters
///
/// Always binds two longitude ranges; a box that does not cross the
/// antimeridian repeats its single range.
#[derive(Debug, Clone, Copy)]
pub struct BoxFilter {
    params: [f64; 6],
}

impl BoxFilter {
    pub fn around(center: &GeoPoint, radius_km: f64) -> Self {
        let bbox = center.bounding_box(radius_km);
        let ranges = bbox.lon_ranges();
        let (a, b) = match ranges.as_slice() {
            [only] => (*only, *only),
            [first, second, ..] => (*first, *second),
            [] => ((-180.0, 180.0), (-180.0, 180.0)),
        };
        Self {
            params: [bbox.min_lat, bbox.max_lat, a.0, a.1, b.0, b.1],
        }
    }

    /// SQL predicate on `alias.latitude` / `alias.longitude`
    pub fn predicate(alias: &str) -> String {
        format!(
            "{a}.latitude BETWEEN ? AND ? AND ({a}.longitude BETWEEN ? AND ? OR {a}.longitude BETWEEN ? AND ?)",
            a = alias
        )
    }

    pub fn params(&self) -> [f64; 6] {
        self.params
    }
}

/// Bind a [`BoxFilter`]'s parameters onto a query
macro_rules! bind_box {
    ($query:expr, $filter:expr) => {{
        let [a, b, c, d, e, f] = $filter.params();
        $query.bind(a).bind(b).bind(c).bind(d).bind(e).bind(f)
    }};
}
pub(crate) use bind_box;
