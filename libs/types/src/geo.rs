//! Geographic point type
//!
//! Points are validated against the national bounding box at construction.
//! Out-of-box points are rejected, never clamped.

use crate::errors::RiskError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Southern edge of the supported bounding box (degrees north)
pub const LAT_MIN: f64 = 33.0;
/// Northern edge of the supported bounding box (degrees north)
pub const LAT_MAX: f64 = 43.0;
/// Western edge of the supported bounding box (degrees east)
pub const LON_MIN: f64 = 124.0;
/// Eastern edge of the supported bounding box (degrees east)
pub const LON_MAX: f64 = 132.0;

/// A validated WGS84 point inside the supported bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

impl GeoPoint {
    /// Create a point, rejecting non-finite or out-of-box coordinates.
    pub fn new(lat: f64, lon: f64) -> Result<Self, RiskError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(RiskError::InvalidLocation {
                lat,
                lon,
                reason: "coordinates must be finite".to_string(),
            });
        }
        if !(LAT_MIN..=LAT_MAX).contains(&lat) || !(LON_MIN..=LON_MAX).contains(&lon) {
            return Err(RiskError::InvalidLocation {
                lat,
                lon,
                reason: format!(
                    "outside bounding box {}-{}N, {}-{}E",
                    LAT_MIN, LAT_MAX, LON_MIN, LON_MAX
                ),
            });
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.lat, self.lon)
    }
}

// Deserialization goes through `new` so a report can never carry an
// unvalidated point.
impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            lat: f64,
            lon: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        GeoPoint::new(raw.lat, raw.lon).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_point() {
        let p = GeoPoint::new(37.5665, 126.9780).unwrap();
        assert_eq!(p.lat(), 37.5665);
        assert_eq!(p.lon(), 126.9780);
    }

    #[test]
    fn test_bounding_box_edges_inclusive() {
        assert!(GeoPoint::new(LAT_MIN, LON_MIN).is_ok());
        assert!(GeoPoint::new(LAT_MAX, LON_MAX).is_ok());
    }

    #[test]
    fn test_out_of_box_rejected() {
        assert!(matches!(
            GeoPoint::new(32.99, 127.0),
            Err(RiskError::InvalidLocation { .. })
        ));
        assert!(matches!(
            GeoPoint::new(37.0, 132.01),
            Err(RiskError::InvalidLocation { .. })
        ));
        // Tokyo
        assert!(GeoPoint::new(35.68, 139.69).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(GeoPoint::new(f64::NAN, 127.0).is_err());
        assert!(GeoPoint::new(37.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: GeoPoint = serde_json::from_str(r#"{"lat":35.1,"lon":129.0}"#).unwrap();
        assert_eq!(ok.lon(), 129.0);

        let bad = serde_json::from_str::<GeoPoint>(r#"{"lat":10.0,"lon":129.0}"#);
        assert!(bad.is_err());
    }
}
