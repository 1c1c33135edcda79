//! Distance helpers.

use std::f64::consts::PI;

/// Mean Earth radius in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate km per degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

pub fn to_radians(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Great-circle distance between two points in km.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = to_radians(lat2 - lat1);
    let dlon = to_radians(lon2 - lon1);

    let a = (dlat / 2.0).sin().powi(2)
        + to_radians(lat1).cos() * to_radians(lat2).cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Straight-line distance in raw degree space.
///
/// Ignores the latitude-dependent scale of longitude and the dateline.
pub fn degree_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    ((lat2 - lat1).powi(2) + (lon2 - lon1).powi(2)).sqrt()
}

/// Eastward distance in km from `ref_lon` at latitude `lat` (negative = west).
pub fn km_east_of(lat: f64, lon: f64, ref_lon: f64) -> f64 {
    (lon - ref_lon) * KM_PER_DEGREE * to_radians(lat).cos()
}

/// Flat-earth distance in km from a reference point, scaled by latitude.
pub fn planar_km(lat: f64, lon: f64, ref_lat: f64, ref_lon: f64) -> f64 {
    let north = (lat - ref_lat) * KM_PER_DEGREE;
    let east = km_east_of(lat, lon, ref_lon);
    (north.powi(2) + east.powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_zero() {
        assert_eq!(haversine_km(30.0, -9.0, 30.0, -9.0), 0.0);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.195).abs() < 0.01, "d={d}");
    }

    #[test]
    fn test_degree_distance_ignores_longitude_scale() {
        // One degree east at 60°N is only ~55 km, but degree space says 1.0.
        assert_eq!(degree_distance(60.0, 0.0, 60.0, 1.0), 1.0);
        assert!(haversine_km(60.0, 0.0, 60.0, 1.0) < 56.0);
    }

    #[test]
    fn test_km_east_of_sign() {
        assert!(km_east_of(30.0, -9.7, -9.5981) < 0.0);
        assert!(km_east_of(30.0, -9.5, -9.5981) > 0.0);
    }

    #[test]
    fn test_planar_km() {
        let d = planar_km(31.4278, -9.5981, 30.4278, -9.5981);
        assert!((d - 111.0).abs() < 1e-9);
    }
}
