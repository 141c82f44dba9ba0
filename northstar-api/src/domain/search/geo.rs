//! Great-circle distance filtering for geo-aware search.

pub const EARTH_RADIUS_MILES: f64 = 3959.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Haversine distance between two points, in miles.
///
/// Directory-scale precision; not a geodesy library.
pub fn haversine_miles(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// An active radius filter around a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFilter {
    pub center: GeoPoint,
    pub radius_miles: f64,
}

impl GeoFilter {
    /// Distance from the center when the point falls inside the radius,
    /// `None` when it should be filtered out.
    pub fn admit(&self, point: GeoPoint) -> Option<f64> {
        let distance = haversine_miles(self.center, point);
        (distance <= self.radius_miles).then_some(distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINNEAPOLIS: GeoPoint = GeoPoint {
        latitude: 44.9778,
        longitude: -93.2650,
    };
    const ST_PAUL: GeoPoint = GeoPoint {
        latitude: 44.9537,
        longitude: -93.0900,
    };
    const ROCHESTER: GeoPoint = GeoPoint {
        latitude: 44.0121,
        longitude: -92.4802,
    };

    #[test]
    fn zero_distance_to_self() {
        assert_eq!(haversine_miles(MINNEAPOLIS, MINNEAPOLIS), 0.0);
    }

    #[test]
    fn twin_cities_are_about_nine_miles_apart() {
        let distance = haversine_miles(MINNEAPOLIS, ST_PAUL);
        assert!((8.0..10.0).contains(&distance), "got {distance}");
    }

    #[test]
    fn rochester_is_well_outside_the_metro() {
        let distance = haversine_miles(MINNEAPOLIS, ROCHESTER);
        assert!(distance > 70.0, "got {distance}");
    }

    #[test]
    fn distance_is_symmetric_and_deterministic() {
        let there = haversine_miles(MINNEAPOLIS, ST_PAUL);
        let back = haversine_miles(ST_PAUL, MINNEAPOLIS);
        assert_eq!(there, back);
        assert_eq!(there, haversine_miles(MINNEAPOLIS, ST_PAUL));
    }

    #[test]
    fn filter_admits_only_points_within_radius() {
        let filter = GeoFilter {
            center: MINNEAPOLIS,
            radius_miles: 10.0,
        };

        let distance = filter.admit(ST_PAUL).expect("St. Paul is inside 10 miles");
        assert!(distance <= 10.0);
        assert!(filter.admit(ROCHESTER).is_none());
    }
}
