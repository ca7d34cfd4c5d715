//! Vulnerability engine
//!
//! Susceptibility of the building itself: structure, age, height, basements,
//! storage. Operational attributes such as purpose or water dependency are
//! exposure concerns and are never read here. Flood models additionally see
//! the exposure result computed for the same hazard.

use std::collections::BTreeMap;

use types::assessment::{ExposureResult, LayerBuilder, VulnerabilityResult};
use types::hazard::HazardType;
use types::score::Score;
use types::site::{fallbacks, BuildingFact, SpatialFact, StructureType};
use types::sourced::{DataSource, FallbackReason, Sourced};

use crate::exposure::{factor, has_storage_capacity};

/// Everything a vulnerability model may read
#[derive(Debug, Clone, Copy)]
pub struct VulnerabilityInputs<'a> {
    pub building: &'a BuildingFact,
    pub spatial: &'a SpatialFact,
    /// Exposure for the same hazard; only supplied for flood hazards.
    pub exposure: Option<&'a ExposureResult>,
}

/// One hazard's vulnerability rule
pub trait VulnerabilityModel: Send + Sync {
    fn hazard_type(&self) -> HazardType;

    fn assess(&self, inputs: &VulnerabilityInputs<'_>) -> VulnerabilityResult;
}

// ── Building attribute helpers ──────────────────────────────────────────

fn age(b: &mut LayerBuilder, building: &BuildingFact) -> u32 {
    b.input(
        "age_years",
        building.attribute(building.age_years, fallbacks::AGE_YEARS, "age_years"),
    )
}

fn structure(b: &mut LayerBuilder, building: &BuildingFact) -> StructureType {
    b.input(
        "structure",
        building.attribute(building.structure, fallbacks::STRUCTURE, "structure"),
    )
}

fn ground_floors(b: &mut LayerBuilder, building: &BuildingFact) -> u32 {
    b.input(
        "ground_floors",
        building.attribute(building.ground_floors, fallbacks::GROUND_FLOORS, "ground_floors"),
    )
}

fn basement_floors(b: &mut LayerBuilder, building: &BuildingFact) -> u32 {
    b.input(
        "basement_floors",
        building.attribute(
            building.basement_floors,
            fallbacks::BASEMENT_FLOORS,
            "basement_floors",
        ),
    )
}

/// `+major` above 30 years, `+minor` above 20.
fn age_penalty(age_years: u32, major: f64, minor: f64) -> f64 {
    if age_years > 30 {
        major
    } else if age_years > 20 {
        minor
    } else {
        0.0
    }
}

/// Registry flag if known, otherwise the statutory storage threshold.
fn water_tank(b: &mut LayerBuilder, building: &BuildingFact) -> bool {
    match building.has_water_tank {
        Some(present) => {
            b.factor("has_water_tank", present);
            b.factor("water_tank_basis", "registry");
            present
        }
        None => {
            let area = b.input(
                "total_floor_area_m2",
                building.attribute(
                    building.total_floor_area_m2,
                    fallbacks::FLOOR_AREA_M2,
                    "total_floor_area_m2",
                ),
            );
            let floors = ground_floors(b, building);
            let present = has_storage_capacity(area, floors);
            b.factor("has_water_tank", present);
            b.factor("water_tank_basis", "legal_threshold_estimate");
            present
        }
    }
}

/// River distance as measured by the injected exposure result, or straight
/// from the building record when no exposure was supplied.
fn river_distance(inputs: &VulnerabilityInputs<'_>) -> Sourced<f64> {
    match inputs.exposure.and_then(|e| e.factor_f64(factor::DISTANCE_TO_RIVER_M).map(|d| (e, d))) {
        Some((exposure, distance)) if exposure.is_fallback() => Sourced::fallback(
            distance,
            FallbackReason::unavailable("river exposure used a fallback distance"),
        ),
        Some((_, distance)) => Sourced::resolved(distance, DataSource::Provider),
        None => inputs.building.attribute(
            inputs.building.distance_to_river_m,
            fallbacks::DISTANCE_TO_RIVER_M,
            factor::DISTANCE_TO_RIVER_M,
        ),
    }
}

// ── Flood ───────────────────────────────────────────────────────────────

/// Shared river / urban flood rule.
///
/// `50 + basement(30) + age(20|10) + river proximity(20|10) + history(10) − piloti(10)`
fn flood_vulnerability(inputs: &VulnerabilityInputs<'_>, river_proximity: bool) -> VulnerabilityResult {
    let mut b = LayerBuilder::new(DataSource::Provider);
    let mut score = 50.0;

    if basement_floors(&mut b, inputs.building) > 0 {
        score += 30.0;
    }
    score += age_penalty(age(&mut b, inputs.building), 20.0, 10.0);

    if river_proximity {
        let distance = b.input(factor::DISTANCE_TO_RIVER_M, river_distance(inputs));
        score += if distance < 100.0 {
            20.0
        } else if distance < 500.0 {
            10.0
        } else {
            0.0
        };
    }

    let history = b.input(
        "flood_history_count",
        inputs.building.attribute(
            inputs.building.flood_history_count,
            fallbacks::FLOOD_HISTORY_COUNT,
            "flood_history_count",
        ),
    );
    if history > 10 {
        score += 10.0;
    }

    let piloti = b.input(
        "has_piloti",
        inputs.building.attribute(inputs.building.has_piloti, fallbacks::HAS_PILOTI, "has_piloti"),
    );
    if piloti {
        score -= 10.0;
    }

    b.finish_scored(Score::new(score))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RiverFloodVulnerability;

impl VulnerabilityModel for RiverFloodVulnerability {
    fn hazard_type(&self) -> HazardType {
        HazardType::RiverFlood
    }

    fn assess(&self, inputs: &VulnerabilityInputs<'_>) -> VulnerabilityResult {
        flood_vulnerability(inputs, true)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UrbanFloodVulnerability;

impl VulnerabilityModel for UrbanFloodVulnerability {
    fn hazard_type(&self) -> HazardType {
        HazardType::UrbanFlood
    }

    fn assess(&self, inputs: &VulnerabilityInputs<'_>) -> VulnerabilityResult {
        flood_vulnerability(inputs, false)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoastalFloodVulnerability;

impl VulnerabilityModel for CoastalFloodVulnerability {
    fn hazard_type(&self) -> HazardType {
        HazardType::CoastalFlood
    }

    /// Ground elevation dominates; basements only matter on low ground.
    fn assess(&self, inputs: &VulnerabilityInputs<'_>) -> VulnerabilityResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let elevation = b.input(
            "elevation_m",
            inputs.spatial.attribute(inputs.spatial.elevation_m, fallbacks::ELEVATION_M, "elevation_m"),
        );

        let mut score = 40.0;
        if elevation < 3.0 {
            score += 50.0;
        } else if elevation < 5.0 {
            score += 30.0;
        } else if elevation >= 10.0 {
            score -= 20.0;
        }

        if elevation < 5.0 && basement_floors(&mut b, inputs.building) > 0 {
            score += 20.0;
        }

        b.finish_scored(Score::new(score))
    }
}

// ── Fire and wind ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct WildfireVulnerability;

impl VulnerabilityModel for WildfireVulnerability {
    fn hazard_type(&self) -> HazardType {
        HazardType::Wildfire
    }

    fn assess(&self, inputs: &VulnerabilityInputs<'_>) -> VulnerabilityResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let material = structure(&mut b, inputs.building);
        let adjustment = if material.is_combustible() {
            40.0
        } else if material == StructureType::ReinforcedConcrete {
            -5.0
        } else {
            0.0
        };
        b.number("structure_adjustment", adjustment);
        b.finish_scored(Score::new(30.0 + adjustment))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TyphoonVulnerability;

impl VulnerabilityModel for TyphoonVulnerability {
    fn hazard_type(&self) -> HazardType {
        HazardType::Typhoon
    }

    fn assess(&self, inputs: &VulnerabilityInputs<'_>) -> VulnerabilityResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let mut score = 40.0;
        score += match structure(&mut b, inputs.building) {
            StructureType::SandwichPanel => 30.0,
            StructureType::Wood => 20.0,
            StructureType::Steel => 10.0,
            StructureType::ReinforcedConcrete | StructureType::Masonry => 0.0,
        };
        score += age_penalty(age(&mut b, inputs.building), 15.0, 10.0);
        if ground_floors(&mut b, inputs.building) >= 20 {
            score += 10.0;
        }
        b.finish_scored(Score::new(score))
    }
}

// ── Temperature ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtremeHeatVulnerability;

impl VulnerabilityModel for ExtremeHeatVulnerability {
    fn hazard_type(&self) -> HazardType {
        HazardType::ExtremeHeat
    }

    fn assess(&self, inputs: &VulnerabilityInputs<'_>) -> VulnerabilityResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let mut score = 40.0;
        score += match structure(&mut b, inputs.building) {
            StructureType::SandwichPanel => 20.0,
            StructureType::Wood | StructureType::Steel => 10.0,
            StructureType::ReinforcedConcrete | StructureType::Masonry => 0.0,
        };
        score += age_penalty(age(&mut b, inputs.building), 20.0, 10.0);
        b.finish_scored(Score::new(score))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtremeColdVulnerability;

impl VulnerabilityModel for ExtremeColdVulnerability {
    fn hazard_type(&self) -> HazardType {
        HazardType::ExtremeCold
    }

    /// Thin envelopes, old pipework and low-rise heat loss.
    fn assess(&self, inputs: &VulnerabilityInputs<'_>) -> VulnerabilityResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let mut score = 40.0;
        score += match structure(&mut b, inputs.building) {
            StructureType::SandwichPanel => 15.0,
            StructureType::Wood => 10.0,
            StructureType::Steel | StructureType::ReinforcedConcrete | StructureType::Masonry => 0.0,
        };
        score += age_penalty(age(&mut b, inputs.building), 20.0, 10.0);
        if ground_floors(&mut b, inputs.building) <= 2 {
            score += 10.0;
        }
        b.finish_scored(Score::new(score))
    }
}

// ── Water supply ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct DroughtVulnerability;

impl VulnerabilityModel for DroughtVulnerability {
    fn hazard_type(&self) -> HazardType {
        HazardType::Drought
    }

    fn assess(&self, inputs: &VulnerabilityInputs<'_>) -> VulnerabilityResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let mut score = 40.0;
        score += if water_tank(&mut b, inputs.building) { -10.0 } else { 10.0 };
        score += age_penalty(age(&mut b, inputs.building), 10.0, 5.0);
        b.finish_scored(Score::new(score))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WaterStressVulnerability;

impl VulnerabilityModel for WaterStressVulnerability {
    fn hazard_type(&self) -> HazardType {
        HazardType::WaterStress
    }

    /// Storage buffer, then plumbing and fixture condition by age.
    fn assess(&self, inputs: &VulnerabilityInputs<'_>) -> VulnerabilityResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let tank_penalty = if water_tank(&mut b, inputs.building) { 0.0 } else { 25.0 };
        let age_years = age(&mut b, inputs.building);
        let plumbing = age_penalty(age_years, 15.0, 10.0);
        let fixtures = if age_years > 15 { 5.0 } else { -5.0 };
        b.number("storage_penalty", tank_penalty);
        b.number("plumbing_penalty", plumbing);
        b.number("fixture_adjustment", fixtures);
        b.finish_scored(Score::new(40.0 + tank_penalty + plumbing + fixtures))
    }
}

// ── Engine ──────────────────────────────────────────────────────────────

/// Registry of vulnerability models
pub struct VulnerabilityEngine {
    models: BTreeMap<HazardType, Box<dyn VulnerabilityModel>>,
}

impl VulnerabilityEngine {
    pub fn new() -> Self {
        let mut engine = Self {
            models: BTreeMap::new(),
        };
        engine.register(Box::new(ExtremeHeatVulnerability));
        engine.register(Box::new(ExtremeColdVulnerability));
        engine.register(Box::new(DroughtVulnerability));
        engine.register(Box::new(RiverFloodVulnerability));
        engine.register(Box::new(UrbanFloodVulnerability));
        engine.register(Box::new(CoastalFloodVulnerability));
        engine.register(Box::new(TyphoonVulnerability));
        engine.register(Box::new(WildfireVulnerability));
        engine.register(Box::new(WaterStressVulnerability));
        engine
    }

    pub fn register(&mut self, model: Box<dyn VulnerabilityModel>) {
        self.models.insert(model.hazard_type(), model);
    }

    pub fn model(&self, hazard: HazardType) -> Option<&dyn VulnerabilityModel> {
        self.models.get(&hazard).map(|m| m.as_ref())
    }

    /// Whether the composer hands this hazard's exposure result over.
    pub fn takes_exposure(hazard: HazardType) -> bool {
        hazard.is_flood()
    }

    pub fn assess(
        &self,
        hazard: HazardType,
        inputs: &VulnerabilityInputs<'_>,
    ) -> Option<VulnerabilityResult> {
        self.model(hazard).map(|m| m.assess(inputs))
    }
}

impl Default for VulnerabilityEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exposure::{ExposureInputs, ExposureModel, RiverFloodExposure};
    use proptest::prelude::*;
    use types::climate::ClimateFactSet;
    use types::scenario::{Scenario, TargetYear};
    use types::site::{BuildingPurpose, WaterDependency};
    use types::score::Tier;

    fn assess(model: &dyn VulnerabilityModel, building: &BuildingFact) -> VulnerabilityResult {
        model.assess(&VulnerabilityInputs {
            building,
            spatial: &SpatialFact::default(),
            exposure: None,
        })
    }

    fn complete_building() -> BuildingFact {
        BuildingFact {
            ground_floors: Some(5),
            basement_floors: Some(0),
            structure: Some(StructureType::ReinforcedConcrete),
            age_years: Some(10),
            purpose: Some(BuildingPurpose::Office),
            total_floor_area_m2: Some(2000.0),
            has_piloti: Some(false),
            has_water_tank: Some(true),
            water_dependency: None,
            distance_to_river_m: Some(2000.0),
            distance_to_coast_m: Some(30_000.0),
            flood_history_count: Some(0),
            provider_failure: None,
        }
    }

    // ── Flood ──

    #[test]
    fn test_river_flood_worst_case() {
        let building = BuildingFact {
            basement_floors: Some(2),
            age_years: Some(45),
            flood_history_count: Some(12),
            has_piloti: Some(false),
            distance_to_river_m: Some(60.0),
            ..complete_building()
        };
        let spatial = SpatialFact::default();
        let climate = ClimateFactSet::new(Scenario::SSP245, TargetYear::new(2050).unwrap());
        let exposure = RiverFloodExposure.assess(&ExposureInputs {
            building: &building,
            spatial: &spatial,
            climate: &climate,
        });
        let result = RiverFloodVulnerability.assess(&VulnerabilityInputs {
            building: &building,
            spatial: &spatial,
            exposure: Some(&exposure),
        });
        // 50 + 30 + 20 + 20 + 10 → clamp
        assert_eq!(result.score, Score::MAX);
        assert_eq!(result.tier, Tier::VeryHigh);
        assert_eq!(result.factor_f64(factor::DISTANCE_TO_RIVER_M), Some(60.0));
        assert_eq!(result.data_source, DataSource::Provider);
    }

    #[test]
    fn test_river_proximity_read_from_exposure() {
        let building = complete_building();
        let mut exposure = RiverFloodExposure.assess(&ExposureInputs {
            building: &building,
            spatial: &SpatialFact::default(),
            climate: &ClimateFactSet::new(Scenario::SSP126, TargetYear::new(2030).unwrap()),
        });
        exposure
            .factors
            .insert(factor::DISTANCE_TO_RIVER_M.to_string(), serde_json::json!(250.0));
        let result = RiverFloodVulnerability.assess(&VulnerabilityInputs {
            building: &building,
            spatial: &SpatialFact::default(),
            exposure: Some(&exposure),
        });
        // 50 + 10 (from the exposure distance, not the 2 km record)
        assert_eq!(result.score, Score::from(60));
    }

    #[test]
    fn test_urban_flood_piloti() {
        let building = BuildingFact {
            has_piloti: Some(true),
            distance_to_river_m: Some(10.0),
            ..complete_building()
        };
        let result = assess(&UrbanFloodVulnerability, &building);
        assert_eq!(result.score, Score::from(40));
        assert!(result.factors.get(factor::DISTANCE_TO_RIVER_M).is_none());
    }

    #[test]
    fn test_coastal_elevation() {
        let assess_at = |elevation: Option<f64>, basements: u32| {
            let building = BuildingFact {
                basement_floors: Some(basements),
                ..complete_building()
            };
            CoastalFloodVulnerability.assess(&VulnerabilityInputs {
                building: &building,
                spatial: &SpatialFact {
                    elevation_m: elevation,
                    ..SpatialFact::default()
                },
                exposure: None,
            })
        };
        assert_eq!(assess_at(Some(2.0), 1).score, Score::MAX);
        assert_eq!(assess_at(Some(4.0), 0).score, Score::from(70));
        assert_eq!(assess_at(Some(7.0), 2).score, Score::from(40));
        assert_eq!(assess_at(Some(25.0), 0).score, Score::from(20));

        let unknown = assess_at(None, 0);
        assert_eq!(unknown.score, Score::from(20));
        assert!(unknown.is_fallback());
    }

    // ── Fire and wind ──

    #[test]
    fn test_wildfire_structure() {
        let panel = BuildingFact {
            structure: Some(StructureType::SandwichPanel),
            ..complete_building()
        };
        assert_eq!(assess(&WildfireVulnerability, &panel).score, Score::from(70));
        assert_eq!(
            assess(&WildfireVulnerability, &complete_building()).score,
            Score::from(25)
        );
    }

    #[test]
    fn test_typhoon_tall_old_panel() {
        let building = BuildingFact {
            structure: Some(StructureType::SandwichPanel),
            age_years: Some(35),
            ground_floors: Some(25),
            ..complete_building()
        };
        // 40 + 30 + 15 + 10
        assert_eq!(assess(&TyphoonVulnerability, &building).score, Score::from(95));
    }

    // ── Temperature ──

    #[test]
    fn test_heat_and_cold() {
        let building = BuildingFact {
            structure: Some(StructureType::Wood),
            age_years: Some(25),
            ground_floors: Some(2),
            ..complete_building()
        };
        assert_eq!(assess(&ExtremeHeatVulnerability, &building).score, Score::from(60));
        // 40 + 10 + 10 + 10
        assert_eq!(assess(&ExtremeColdVulnerability, &building).score, Score::from(70));
    }

    #[test]
    fn test_missing_building_uses_fallbacks() {
        let result = assess(&ExtremeHeatVulnerability, &BuildingFact::default());
        // RC, 25 years → 40 + 10
        assert_eq!(result.score, Score::from(50));
        assert!(result.is_fallback());
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.factor_str("structure"), Some("reinforced_concrete"));
    }

    // ── Water supply ──

    #[test]
    fn test_water_stress_tank() {
        let no_tank = BuildingFact {
            has_water_tank: Some(false),
            age_years: Some(35),
            ..complete_building()
        };
        // 40 + 25 + 15 + 5
        assert_eq!(assess(&WaterStressVulnerability, &no_tank).score, Score::from(85));

        let new_with_tank = BuildingFact {
            age_years: Some(5),
            ..complete_building()
        };
        // 40 + 0 + 0 - 5
        assert_eq!(
            assess(&WaterStressVulnerability, &new_with_tank).score,
            Score::from(35)
        );
    }

    #[test]
    fn test_water_tank_legal_estimate() {
        let large = BuildingFact {
            has_water_tank: None,
            total_floor_area_m2: Some(3500.0),
            age_years: Some(10),
            ..complete_building()
        };
        let result = assess(&DroughtVulnerability, &large);
        assert_eq!(result.score, Score::from(30));
        assert_eq!(result.factor_str("water_tank_basis"), Some("legal_threshold_estimate"));

        let small = BuildingFact {
            has_water_tank: None,
            total_floor_area_m2: Some(400.0),
            ground_floors: Some(2),
            age_years: Some(22),
            ..complete_building()
        };
        // 40 + 10 + 5
        assert_eq!(assess(&DroughtVulnerability, &small).score, Score::from(55));
    }

    #[test]
    fn test_engine_registry() {
        let engine = VulnerabilityEngine::new();
        for hazard in HazardType::ALL {
            assert_eq!(engine.model(hazard).unwrap().hazard_type(), hazard);
        }
        assert!(VulnerabilityEngine::takes_exposure(HazardType::CoastalFlood));
        assert!(!VulnerabilityEngine::takes_exposure(HazardType::Drought));
    }

    fn purpose_strategy() -> impl Strategy<Value = Option<BuildingPurpose>> {
        prop::option::of(prop::sample::select(vec![
            BuildingPurpose::Residential,
            BuildingPurpose::Office,
            BuildingPurpose::Commercial,
            BuildingPurpose::Industrial,
            BuildingPurpose::Lodging,
            BuildingPurpose::Medical,
            BuildingPurpose::Education,
            BuildingPurpose::Warehouse,
            BuildingPurpose::Other,
        ]))
    }

    fn dependency_strategy() -> impl Strategy<Value = Option<WaterDependency>> {
        prop::option::of(prop::sample::select(vec![
            WaterDependency::Low,
            WaterDependency::Medium,
            WaterDependency::High,
        ]))
    }

    proptest! {
        #[test]
        fn prop_operational_attributes_ignored(
            purpose in purpose_strategy(),
            dependency in dependency_strategy(),
            age in 0u32..80,
            basements in 0u32..4,
        ) {
            let engine = VulnerabilityEngine::new();
            let base = BuildingFact {
                age_years: Some(age),
                basement_floors: Some(basements),
                ..complete_building()
            };
            let varied = BuildingFact {
                purpose,
                water_dependency: dependency,
                ..base.clone()
            };
            for hazard in [
                HazardType::RiverFlood,
                HazardType::UrbanFlood,
                HazardType::CoastalFlood,
                HazardType::ExtremeHeat,
                HazardType::ExtremeCold,
            ] {
                let a = engine.assess(hazard, &VulnerabilityInputs {
                    building: &base,
                    spatial: &SpatialFact::default(),
                    exposure: None,
                }).unwrap();
                let b = engine.assess(hazard, &VulnerabilityInputs {
                    building: &varied,
                    spatial: &SpatialFact::default(),
                    exposure: None,
                }).unwrap();
                prop_assert_eq!(a.score, b.score);
            }
        }
    }
}
