//! Request validation
//!
//! The only place a composition can fail. Checks, in order:
//! 1. Location is finite and inside the national bounding box
//! 2. Target year within the archive range
//! 3. At least one scenario, duplicates removed (first occurrence kept)

use types::errors::RiskError;
use types::geo::GeoPoint;
use types::scenario::{Scenario, TargetYear};

/// A request that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentRequest {
    pub point: GeoPoint,
    pub year: TargetYear,
    pub scenarios: Vec<Scenario>,
}

/// Validate a composition request.
pub fn validate_request(
    point: GeoPoint,
    year: i32,
    scenarios: &[Scenario],
) -> Result<AssessmentRequest, RiskError> {
    // Deserialized and constructed points share one validation path
    let point = GeoPoint::new(point.lat(), point.lon())?;
    let year = TargetYear::new(year)?;
    let scenarios = dedup_scenarios(scenarios)?;
    Ok(AssessmentRequest {
        point,
        year,
        scenarios,
    })
}

/// Raw coordinates variant, for callers that never built a [`GeoPoint`].
pub fn validate_coordinates(
    lat: f64,
    lon: f64,
    year: i32,
    scenarios: &[Scenario],
) -> Result<AssessmentRequest, RiskError> {
    validate_request(GeoPoint::new(lat, lon)?, year, scenarios)
}

fn dedup_scenarios(scenarios: &[Scenario]) -> Result<Vec<Scenario>, RiskError> {
    let mut unique: Vec<Scenario> = Vec::with_capacity(scenarios.len());
    for &scenario in scenarios {
        if !unique.contains(&scenario) {
            unique.push(scenario);
        }
    }
    if unique.is_empty() {
        return Err(RiskError::EmptyScenarioSet);
    }
    Ok(unique)
}

/// Parse scenario names as accepted from callers ("ssp5-8.5", "SSP585", ...).
pub fn parse_scenarios<S: AsRef<str>>(names: &[S]) -> Result<Vec<Scenario>, RiskError> {
    names.iter().map(|n| n.as_ref().parse()).collect()
}
