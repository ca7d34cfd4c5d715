//! Spatial and building facts supplied by external collaborators
//!
//! Every field is independently optional. The engines resolve absent fields
//! to documented fallbacks (see [`fallbacks`]) and record a warning.

use crate::sourced::{DataSource, FallbackReason, Sourced};
use serde::{Deserialize, Serialize};

/// Land-cover class of the cell containing the point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandCover {
    Urban,
    Cropland,
    Forest,
    Grassland,
    Wetland,
    Barren,
    Water,
}

/// Vegetation fuel load around the point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelLevel {
    Low,
    Medium,
    High,
}

impl FuelLevel {
    /// Fuel level derived from NDVI: >= 0.6 high, >= 0.3 medium, else low.
    pub fn from_ndvi(ndvi: f64) -> FuelLevel {
        if ndvi >= 0.6 {
            FuelLevel::High
        } else if ndvi >= 0.3 {
            FuelLevel::Medium
        } else {
            FuelLevel::Low
        }
    }
}

/// Primary structure material from the building registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    ReinforcedConcrete,
    Steel,
    Masonry,
    Wood,
    SandwichPanel,
}

impl StructureType {
    /// Combustible envelopes that ember attack can ignite.
    pub fn is_combustible(&self) -> bool {
        matches!(self, StructureType::Wood | StructureType::SandwichPanel)
    }
}

/// Main registered use of the building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingPurpose {
    Residential,
    Office,
    Commercial,
    Industrial,
    Lodging,
    Medical,
    Education,
    Warehouse,
    Other,
}

/// How much a building's operations depend on water supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterDependency {
    Low,
    Medium,
    High,
}

impl WaterDependency {
    /// industrial/lodging/medical = high; residential/office/commercial =
    /// medium; everything else low.
    pub fn from_purpose(purpose: BuildingPurpose) -> WaterDependency {
        match purpose {
            BuildingPurpose::Industrial | BuildingPurpose::Lodging | BuildingPurpose::Medical => {
                WaterDependency::High
            }
            BuildingPurpose::Residential | BuildingPurpose::Office | BuildingPurpose::Commercial => {
                WaterDependency::Medium
            }
            BuildingPurpose::Education | BuildingPurpose::Warehouse | BuildingPurpose::Other => {
                WaterDependency::Low
            }
        }
    }
}

/// Terrain and land-surface attributes of a point
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialFact {
    pub land_cover: Option<LandCover>,
    pub ndvi: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub elevation_m: Option<f64>,
    pub stream_order: Option<u8>,
    /// Share of sealed surface in the surrounding cell, 0..1
    pub impervious_ratio: Option<f64>,
    pub distance_to_forest_m: Option<f64>,
    pub vegetation_fuel: Option<FuelLevel>,
    /// Set when the spatial collaborator failed; every attribute is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_failure: Option<String>,
}

/// Attributes of the nearest building record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingFact {
    pub ground_floors: Option<u32>,
    pub basement_floors: Option<u32>,
    pub structure: Option<StructureType>,
    pub age_years: Option<u32>,
    pub purpose: Option<BuildingPurpose>,
    pub total_floor_area_m2: Option<f64>,
    pub has_piloti: Option<bool>,
    /// Registry flag for a rooftop/underground water-storage tank
    pub has_water_tank: Option<bool>,
    /// Explicit override of the purpose-derived classification
    pub water_dependency: Option<WaterDependency>,
    pub distance_to_river_m: Option<f64>,
    pub distance_to_coast_m: Option<f64>,
    pub flood_history_count: Option<u32>,
    /// Set when the building collaborator failed; every attribute is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_failure: Option<String>,
}

fn absence_reason(provider_failure: Option<&str>, what: &str) -> FallbackReason {
    match provider_failure {
        Some(detail) => FallbackReason::collaborator(format!("{} unavailable, {}", what, detail)),
        None => FallbackReason::unavailable(format!("{} missing", what)),
    }
}

fn attribute<T>(value: Option<T>, fallback: T, reason: impl FnOnce() -> FallbackReason) -> Sourced<T> {
    match value {
        Some(v) => Sourced::resolved(v, DataSource::Provider),
        None => Sourced::fallback(fallback, reason()),
    }
}

impl SpatialFact {
    /// Facts standing in for a failed spatial collaborator.
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            provider_failure: Some(detail.into()),
            ..Self::default()
        }
    }

    /// Why `what` is absent from these facts.
    pub fn absence(&self, what: &str) -> FallbackReason {
        absence_reason(self.provider_failure.as_deref(), what)
    }

    /// Provider value if present, otherwise `fallback` tagged with [`Self::absence`].
    pub fn attribute<T>(&self, value: Option<T>, fallback: T, what: &str) -> Sourced<T> {
        attribute(value, fallback, || self.absence(what))
    }
}

impl BuildingFact {
    /// Facts standing in for a failed building collaborator.
    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            provider_failure: Some(detail.into()),
            ..Self::default()
        }
    }

    pub fn absence(&self, what: &str) -> FallbackReason {
        absence_reason(self.provider_failure.as_deref(), what)
    }

    /// Provider value if present, otherwise `fallback` tagged with [`Self::absence`].
    pub fn attribute<T>(&self, value: Option<T>, fallback: T, what: &str) -> Sourced<T> {
        attribute(value, fallback, || self.absence(what))
    }
}

/// Documented fallbacks for absent attributes
pub mod fallbacks {
    use super::{BuildingPurpose, StructureType};

    pub const GROUND_FLOORS: u32 = 3;
    pub const BASEMENT_FLOORS: u32 = 0;
    pub const STRUCTURE: StructureType = StructureType::ReinforcedConcrete;
    pub const AGE_YEARS: u32 = 25;
    pub const PURPOSE: BuildingPurpose = BuildingPurpose::Residential;
    pub const FLOOR_AREA_M2: f64 = 1000.0;
    pub const DISTANCE_TO_RIVER_M: f64 = 750.0;
    pub const DISTANCE_TO_COAST_M: f64 = 10_000.0;
    pub const FLOOD_HISTORY_COUNT: u32 = 0;
    pub const HAS_PILOTI: bool = false;
    pub const ELEVATION_M: f64 = 50.0;
    pub const STREAM_ORDER: u8 = 3;
    /// Used when neither the ratio nor the land cover is known.
    pub const IMPERVIOUS_RATIO: f64 = 0.4;
    /// Used when neither the distance nor the land cover is known.
    pub const DISTANCE_TO_FOREST_M: f64 = 1500.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuel_from_ndvi() {
        assert_eq!(FuelLevel::from_ndvi(0.75), FuelLevel::High);
        assert_eq!(FuelLevel::from_ndvi(0.6), FuelLevel::High);
        assert_eq!(FuelLevel::from_ndvi(0.45), FuelLevel::Medium);
        assert_eq!(FuelLevel::from_ndvi(0.1), FuelLevel::Low);
    }

    #[test]
    fn test_water_dependency_from_purpose() {
        assert_eq!(
            WaterDependency::from_purpose(BuildingPurpose::Medical),
            WaterDependency::High
        );
        assert_eq!(
            WaterDependency::from_purpose(BuildingPurpose::Office),
            WaterDependency::Medium
        );
        assert_eq!(
            WaterDependency::from_purpose(BuildingPurpose::Warehouse),
            WaterDependency::Low
        );
    }

    #[test]
    fn test_combustible() {
        assert!(StructureType::Wood.is_combustible());
        assert!(StructureType::SandwichPanel.is_combustible());
        assert!(!StructureType::ReinforcedConcrete.is_combustible());
    }

    #[test]
    fn test_default_facts_all_none() {
        let b = BuildingFact::default();
        assert!(b.structure.is_none());
        let s = SpatialFact::default();
        assert!(s.land_cover.is_none());
    }

    #[test]
    fn test_building_fact_partial_json() {
        let b: BuildingFact =
            serde_json::from_str(r#"{"structure":"sandwich_panel","age_years":31}"#).unwrap();
        assert_eq!(b.structure, Some(StructureType::SandwichPanel));
        assert_eq!(b.age_years, Some(31));
        assert!(b.basement_floors.is_none());
        assert!(b.provider_failure.is_none());
    }

    // ── Attribute provenance ──

    #[test]
    fn test_attribute_missing_from_working_provider() {
        let b = BuildingFact::default();
        let age = b.attribute(b.age_years, fallbacks::AGE_YEARS, "age_years");
        assert_eq!(age.get(), 25);
        assert_eq!(
            age.fallback_reason(),
            Some(&FallbackReason::unavailable("age_years missing"))
        );

        let present = b.attribute(Some(40u32), fallbacks::AGE_YEARS, "age_years");
        assert_eq!(present.data_source(), DataSource::Provider);
    }

    #[test]
    fn test_attribute_from_failed_provider() {
        let s = SpatialFact::unavailable("spatial provider timed out after 500 ms");
        let elevation = s.attribute(s.elevation_m, fallbacks::ELEVATION_M, "elevation_m");
        assert_eq!(elevation.get(), 50.0);
        let reason = elevation.fallback_reason().unwrap();
        assert!(matches!(reason, FallbackReason::CollaboratorFailure { .. }));
        assert_eq!(
            reason.to_string(),
            "collaborator failure: elevation_m unavailable, spatial provider timed out after 500 ms"
        );
    }

    #[test]
    fn test_failure_skipped_in_json_when_absent() {
        let json = serde_json::to_value(BuildingFact::default()).unwrap();
        assert!(json.get("provider_failure").is_none());
        let json = serde_json::to_value(BuildingFact::unavailable("down")).unwrap();
        assert_eq!(json["provider_failure"], "down");
    }
}
