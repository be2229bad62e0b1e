//! Geographic positions and great-circle distance
//!
//! Positions are decimal degrees. Construction goes through `GeoPoint::new`
//! so out-of-range coordinates are rejected before they reach any distance
//! math.

use thiserror::Error;

/// Mean Earth radius in kilometers used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Invalid coordinate passed to [`GeoPoint::new`]
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoError {
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// A point on the Earth sphere in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Create a point, rejecting out-of-range coordinates
    ///
    /// NaN and infinities fail the range checks as well.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::LongitudeOutOfRange(longitude));
        }
        Ok(Self { latitude, longitude })
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to another point in kilometers (haversine)
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let dlat = (other.latitude - self.latitude).to_radians();
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint::new(latitude, longitude).unwrap()
    }

    #[test]
    fn test_new_accepts_boundaries() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
        assert!(GeoPoint::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert_eq!(GeoPoint::new(90.001, 0.0), Err(GeoError::LatitudeOutOfRange(90.001)));
        assert_eq!(GeoPoint::new(-91.0, 0.0), Err(GeoError::LatitudeOutOfRange(-91.0)));
        assert_eq!(GeoPoint::new(0.0, 180.5), Err(GeoError::LongitudeOutOfRange(180.5)));
        assert_eq!(GeoPoint::new(0.0, -200.0), Err(GeoError::LongitudeOutOfRange(-200.0)));
    }

    #[test]
    fn test_new_rejects_non_finite() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::NAN).is_err());
        assert!(GeoPoint::new(f64::INFINITY, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_distance_zero_at_same_point() {
        let nyc = p(40.730, -74.010);
        assert_eq!(nyc.distance_km(&nyc), 0.0);
    }

    #[test]
    fn test_distance_symmetric() {
        let nyc = p(40.730, -74.010);
        let la = p(34.052, -118.243);
        assert!((nyc.distance_km(&la) - la.distance_km(&nyc)).abs() < 1e-9);

        let a = p(12.34, 56.78);
        let b = p(-43.21, -87.65);
        assert!((a.distance_km(&b) - b.distance_km(&a)).abs() < 1e-9);
    }

    #[test]
    fn test_distance_non_negative() {
        let points =
            [p(0.0, 0.0), p(90.0, 0.0), p(-90.0, 0.0), p(40.730, -74.010), p(34.052, -118.243)];
        for a in &points {
            for b in &points {
                assert!(a.distance_km(b) >= 0.0);
            }
        }
    }

    #[test]
    fn test_quarter_circumference() {
        // 6371 * pi / 2
        let d = p(0.0, 0.0).distance_km(&p(0.0, 90.0));
        assert!((d - 10007.543398010286).abs() < 1e-6);
    }

    #[test]
    fn test_antipodal_on_equator() {
        // 6371 * pi
        let d = p(0.0, 0.0).distance_km(&p(0.0, 180.0));
        assert!((d - 20015.086796020572).abs() < 1e-6);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let d = p(0.0, 0.0).distance_km(&p(1.0, 0.0));
        assert!((d - 111.19492664455873).abs() < 1e-6);
    }

    #[test]
    fn test_city_scale_distance() {
        // Lower Manhattan pair roughly 1 km apart
        let d = p(40.730, -74.010).distance_km(&p(40.725, -74.000));
        assert!((d - 1.0095).abs() < 1e-3);
    }
}
