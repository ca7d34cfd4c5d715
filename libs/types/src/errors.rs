//! Error types for the risk composition engine
//!
//! Only request validation is allowed to fail a composition. Every other
//! problem (missing archives, collaborator outages, absent attributes) is
//! recovered as a [`FallbackReason`](crate::sourced::FallbackReason) instead.

use thiserror::Error;

/// Top-level request error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("Invalid location ({lat}, {lon}): {reason}")]
    InvalidLocation { lat: f64, lon: f64, reason: String },

    #[error("Target year {year} outside supported range {min}-{max}")]
    OutOfRangeYear { year: i32, min: i32, max: i32 },

    #[error("No scenarios requested")]
    EmptyScenarioSet,

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Unknown hazard type: {0}")]
    UnknownHazard(String),
}

impl RiskError {
    /// Location error for a point that could not be resolved at all
    /// (e.g. a failed geocoding lookup).
    pub fn unresolved_location(reason: impl Into<String>) -> Self {
        RiskError::InvalidLocation {
            lat: f64::NAN,
            lon: f64::NAN,
            reason: reason.into(),
        }
    }

    /// Whether the error is a location/year validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RiskError::InvalidLocation { .. } | RiskError::OutOfRangeYear { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_year_display() {
        let err = RiskError::OutOfRangeYear {
            year: 2150,
            min: 2021,
            max: 2100,
        };
        assert_eq!(
            err.to_string(),
            "Target year 2150 outside supported range 2021-2100"
        );
    }

    #[test]
    fn test_invalid_location_display() {
        let err = RiskError::InvalidLocation {
            lat: 50.0,
            lon: 127.0,
            reason: "outside bounding box".to_string(),
        };
        assert!(err.to_string().contains("50"));
        assert!(err.to_string().contains("outside bounding box"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_unresolved_location() {
        let err = RiskError::unresolved_location("geocoder timeout");
        assert!(matches!(err, RiskError::InvalidLocation { .. }));
        assert!(err.to_string().contains("geocoder timeout"));
    }

    #[test]
    fn test_empty_scenarios_not_validation() {
        assert!(!RiskError::EmptyScenarioSet.is_validation());
    }
}
