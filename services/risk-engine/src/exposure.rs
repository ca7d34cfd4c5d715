//! Exposure engine
//!
//! How much of the asset stands in the hazard's way, from building and site
//! facts. Exposure never reads hazard results. The only climate input is
//! annual precipitation, used by the drought and water-stress models.

use std::collections::BTreeMap;

use types::assessment::{ExposureResult, LayerBuilder};
use types::climate::{ClimateFactSet, ClimateVariable};
use types::hazard::HazardType;
use types::score::{Score, Tier};
use types::site::{fallbacks, BuildingFact, LandCover, SpatialFact, WaterDependency};
use types::sourced::{DataSource, Sourced};

use crate::ladder::{rung, Bound, Ladder, Rung};

/// Factor names read across layers
pub mod factor {
    pub const DISTANCE_TO_RIVER_M: &str = "distance_to_river_m";
    pub const DISTANCE_TO_COAST_M: &str = "distance_to_coast_m";
    pub const IMPERVIOUS_RATIO: &str = "impervious_ratio";
}

/// Everything an exposure model may read
#[derive(Debug, Clone, Copy)]
pub struct ExposureInputs<'a> {
    pub building: &'a BuildingFact,
    pub spatial: &'a SpatialFact,
    pub climate: &'a ClimateFactSet,
}

/// One hazard's exposure rule
pub trait ExposureModel: Send + Sync {
    fn hazard_type(&self) -> HazardType;

    /// Climate variables read from [`ExposureInputs::climate`].
    fn required_variables(&self) -> &'static [ClimateVariable] {
        &[]
    }

    fn assess(&self, inputs: &ExposureInputs<'_>) -> ExposureResult;
}

// ── Shared bands ────────────────────────────────────────────────────────

const DISTANCE_RUNGS: [Rung; 3] = [
    rung(100.0, 90, Tier::VeryHigh),
    rung(500.0, 70, Tier::High),
    rung(1000.0, 50, Tier::Medium),
];
const DISTANCE: Ladder = Ladder::new(Bound::Below, &DISTANCE_RUNGS, (20, Tier::Low));

/// Proximity band for river, coast and forest distances.
///
/// | Distance (m) | Score | Tier |
/// |--------------|-------|------|
/// | < 100        | 90    | very_high (critical) |
/// | < 500        | 70    | high |
/// | < 1000       | 50    | medium |
/// | otherwise    | 20    | low |
pub fn distance_band(distance_m: f64) -> (u8, Tier) {
    DISTANCE.classify(distance_m)
}

fn proximity_class(tier: Tier) -> &'static str {
    match tier {
        Tier::VeryHigh => "critical",
        Tier::High => "high",
        Tier::Medium => "medium",
        Tier::Low => "low",
    }
}

/// Record the land cover; unknown land cover taints the result.
fn land_cover(b: &mut LayerBuilder, spatial: &SpatialFact) -> Option<LandCover> {
    match spatial.land_cover {
        Some(lc) => {
            b.factor("land_cover", serde_json::to_value(lc).unwrap_or_default());
            Some(lc)
        }
        None => {
            b.factor("land_cover", serde_json::Value::Null);
            b.warn(format!("land_cover: fallback used ({})", spatial.absence("land_cover")));
            b.taint();
            None
        }
    }
}

/// Sealed-surface share: measured, else implied by land cover, else 0.4.
pub fn resolve_impervious(spatial: &SpatialFact) -> Sourced<f64> {
    if let Some(ratio) = spatial.impervious_ratio.filter(|r| r.is_finite()) {
        return Sourced::resolved(ratio.clamp(0.0, 1.0), DataSource::Provider);
    }
    match spatial.land_cover {
        Some(lc) => Sourced::resolved(impervious_from_land_cover(lc), DataSource::Provider),
        None => Sourced::fallback(
            fallbacks::IMPERVIOUS_RATIO,
            spatial.absence("impervious_ratio and land_cover"),
        ),
    }
}

fn impervious_from_land_cover(land_cover: LandCover) -> f64 {
    match land_cover {
        LandCover::Urban => 0.7,
        LandCover::Barren => 0.3,
        LandCover::Cropland => 0.2,
        LandCover::Grassland => 0.1,
        LandCover::Forest => 0.05,
        LandCover::Wetland | LandCover::Water => 0.0,
    }
}

/// Explicit dependency, else implied by purpose, else the residential default.
pub fn resolve_water_dependency(building: &BuildingFact) -> Sourced<WaterDependency> {
    if let Some(dependency) = building.water_dependency {
        return Sourced::resolved(dependency, DataSource::Provider);
    }
    match building.purpose {
        Some(purpose) => Sourced::resolved(
            WaterDependency::from_purpose(purpose),
            DataSource::Provider,
        ),
        None => Sourced::fallback(
            WaterDependency::from_purpose(fallbacks::PURPOSE),
            building.absence("water_dependency and purpose"),
        ),
    }
}

// ── Flood ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct RiverFloodExposure;

impl ExposureModel for RiverFloodExposure {
    fn hazard_type(&self) -> HazardType {
        HazardType::RiverFlood
    }

    fn assess(&self, inputs: &ExposureInputs<'_>) -> ExposureResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let distance = b.input(
            factor::DISTANCE_TO_RIVER_M,
            inputs.building.attribute(
                inputs.building.distance_to_river_m,
                fallbacks::DISTANCE_TO_RIVER_M,
                factor::DISTANCE_TO_RIVER_M,
            ),
        );
        let (score, tier) = distance_band(distance);
        b.factor("proximity", proximity_class(tier));
        b.finish(Score::from(score), tier)
    }
}

/// Beyond this the coast no longer matters for flooding.
const COASTAL_CUTOFF_M: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct CoastalFloodExposure;

impl ExposureModel for CoastalFloodExposure {
    fn hazard_type(&self) -> HazardType {
        HazardType::CoastalFlood
    }

    fn assess(&self, inputs: &ExposureInputs<'_>) -> ExposureResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let distance = b.input(
            factor::DISTANCE_TO_COAST_M,
            inputs.building.attribute(
                inputs.building.distance_to_coast_m,
                fallbacks::DISTANCE_TO_COAST_M,
                factor::DISTANCE_TO_COAST_M,
            ),
        );
        let (score, tier) = if distance >= COASTAL_CUTOFF_M {
            (5, Tier::Low)
        } else {
            distance_band(distance)
        };
        b.factor("proximity", proximity_class(tier));
        b.finish(Score::from(score), tier)
    }
}

const IMPERVIOUS_RUNGS: [Rung; 3] = [
    rung(0.8, 90, Tier::VeryHigh),
    rung(0.6, 70, Tier::High),
    rung(0.4, 50, Tier::Medium),
];
const IMPERVIOUS: Ladder = Ladder::new(Bound::AtLeast, &IMPERVIOUS_RUNGS, (25, Tier::Low));

#[derive(Debug, Clone, Copy, Default)]
pub struct UrbanFloodExposure;

impl ExposureModel for UrbanFloodExposure {
    fn hazard_type(&self) -> HazardType {
        HazardType::UrbanFlood
    }

    fn assess(&self, inputs: &ExposureInputs<'_>) -> ExposureResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let ratio = b.input(factor::IMPERVIOUS_RATIO, resolve_impervious(inputs.spatial));
        let (score, tier) = IMPERVIOUS.classify(ratio);
        b.finish(Score::from(score), tier)
    }
}

// ── Temperature ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtremeHeatExposure;

impl ExposureModel for ExtremeHeatExposure {
    fn hazard_type(&self) -> HazardType {
        HazardType::ExtremeHeat
    }

    /// Land-use intensity (urban heat island), +10 on heavily sealed ground.
    fn assess(&self, inputs: &ExposureInputs<'_>) -> ExposureResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let intensity = match land_cover(&mut b, inputs.spatial) {
            Some(LandCover::Urban) => 80.0,
            Some(LandCover::Barren) | Some(LandCover::Cropland) => 50.0,
            Some(LandCover::Grassland) => 40.0,
            Some(LandCover::Forest) => 30.0,
            Some(LandCover::Wetland) | Some(LandCover::Water) => 20.0,
            None => 60.0,
        };
        b.number("land_use_intensity", intensity);

        let ratio = b.input(factor::IMPERVIOUS_RATIO, resolve_impervious(inputs.spatial));
        let sealed_bonus = if ratio >= 0.6 { 10.0 } else { 0.0 };
        b.number("sealed_surface_bonus", sealed_bonus);

        b.finish_scored(Score::new(intensity + sealed_bonus))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtremeColdExposure;

impl ExposureModel for ExtremeColdExposure {
    fn hazard_type(&self) -> HazardType {
        HazardType::ExtremeCold
    }

    fn assess(&self, inputs: &ExposureInputs<'_>) -> ExposureResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let base = match land_cover(&mut b, inputs.spatial) {
            Some(LandCover::Urban) => 50.0,
            Some(LandCover::Cropland)
            | Some(LandCover::Grassland)
            | Some(LandCover::Barren)
            | Some(LandCover::Forest) => 60.0,
            Some(LandCover::Wetland) | Some(LandCover::Water) => 40.0,
            None => 55.0,
        };
        b.number("land_cover_base", base);

        let elevation = b.input(
            "elevation_m",
            inputs.spatial.attribute(inputs.spatial.elevation_m, fallbacks::ELEVATION_M, "elevation_m"),
        );
        let elevation_bonus = if elevation >= 500.0 {
            20.0
        } else if elevation >= 200.0 {
            10.0
        } else {
            0.0
        };
        b.number("elevation_bonus", elevation_bonus);

        b.finish_scored(Score::new(base + elevation_bonus))
    }
}

// ── Water supply ────────────────────────────────────────────────────────

/// Dependency base, dry-climate bonus and storage relief shared by drought
/// and water stress.
///
/// `score = base(dependency) + precipitation_bonus − storage_relief`
fn water_supply_exposure(
    inputs: &ExposureInputs<'_>,
    base_for: fn(WaterDependency) -> f64,
) -> ExposureResult {
    let mut b = LayerBuilder::new(DataSource::Provider);
    let dependency = b.input("water_dependency", resolve_water_dependency(inputs.building));
    let base = base_for(dependency);
    b.number("dependency_base", base);

    let precipitation = b.climate(
        "annual_precipitation_mm",
        &inputs.climate.get(ClimateVariable::AnnualPrecipitation),
    );
    let precipitation_bonus = if precipitation < 1000.0 {
        15.0
    } else if precipitation < 1200.0 {
        5.0
    } else {
        0.0
    };
    b.number("precipitation_bonus", precipitation_bonus);

    let floor_area = b.input(
        "total_floor_area_m2",
        inputs.building.attribute(
            inputs.building.total_floor_area_m2,
            fallbacks::FLOOR_AREA_M2,
            "total_floor_area_m2",
        ),
    );
    let floors = b.input(
        "ground_floors",
        inputs.building.attribute(
            inputs.building.ground_floors,
            fallbacks::GROUND_FLOORS,
            "ground_floors",
        ),
    );
    let storage_relief = if has_storage_capacity(floor_area, floors) {
        10.0
    } else {
        0.0
    };
    b.number("storage_relief", storage_relief);

    b.finish_scored(Score::new(base + precipitation_bonus - storage_relief))
}

/// Buildings of 3000 m² or 6 floors and more must carry water storage.
pub fn has_storage_capacity(floor_area_m2: f64, ground_floors: u32) -> bool {
    floor_area_m2 >= 3000.0 || ground_floors >= 6
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DroughtExposure;

impl ExposureModel for DroughtExposure {
    fn hazard_type(&self) -> HazardType {
        HazardType::Drought
    }

    fn required_variables(&self) -> &'static [ClimateVariable] {
        &[ClimateVariable::AnnualPrecipitation]
    }

    fn assess(&self, inputs: &ExposureInputs<'_>) -> ExposureResult {
        water_supply_exposure(inputs, |dependency| match dependency {
            WaterDependency::High => 80.0,
            WaterDependency::Medium => 50.0,
            WaterDependency::Low => 30.0,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WaterStressExposure;

impl ExposureModel for WaterStressExposure {
    fn hazard_type(&self) -> HazardType {
        HazardType::WaterStress
    }

    fn required_variables(&self) -> &'static [ClimateVariable] {
        &[ClimateVariable::AnnualPrecipitation]
    }

    fn assess(&self, inputs: &ExposureInputs<'_>) -> ExposureResult {
        water_supply_exposure(inputs, |dependency| match dependency {
            WaterDependency::High => 90.0,
            WaterDependency::Medium => 60.0,
            WaterDependency::Low => 30.0,
        })
    }
}

// ── Wildfire ────────────────────────────────────────────────────────────

/// Measured distance to the forest edge, else implied by land cover.
pub fn resolve_forest_distance(spatial: &SpatialFact) -> Sourced<f64> {
    if let Some(distance) = spatial.distance_to_forest_m.filter(|d| d.is_finite()) {
        return Sourced::resolved(distance.max(0.0), DataSource::Provider);
    }
    match spatial.land_cover {
        Some(LandCover::Forest) => Sourced::resolved(0.0, DataSource::Provider),
        Some(LandCover::Grassland) => Sourced::resolved(300.0, DataSource::Provider),
        Some(LandCover::Cropland) => Sourced::resolved(800.0, DataSource::Provider),
        Some(_) => Sourced::resolved(fallbacks::DISTANCE_TO_FOREST_M, DataSource::Provider),
        None => Sourced::fallback(
            fallbacks::DISTANCE_TO_FOREST_M,
            spatial.absence("distance_to_forest_m and land_cover"),
        ),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WildfireExposure;

impl ExposureModel for WildfireExposure {
    fn hazard_type(&self) -> HazardType {
        HazardType::Wildfire
    }

    fn assess(&self, inputs: &ExposureInputs<'_>) -> ExposureResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let distance = b.input("distance_to_forest_m", resolve_forest_distance(inputs.spatial));
        let (score, tier) = distance_band(distance);
        b.factor("proximity", proximity_class(tier));
        b.finish(Score::from(score), tier)
    }
}

// ── Typhoon ─────────────────────────────────────────────────────────────

const TYPHOON_COAST_RUNGS: [Rung; 2] = [
    rung(5_000.0, 80, Tier::VeryHigh),
    rung(20_000.0, 60, Tier::High),
];
const TYPHOON_COAST: Ladder = Ladder::new(Bound::Below, &TYPHOON_COAST_RUNGS, (40, Tier::Medium));

#[derive(Debug, Clone, Copy, Default)]
pub struct TyphoonExposure;

impl ExposureModel for TyphoonExposure {
    fn hazard_type(&self) -> HazardType {
        HazardType::Typhoon
    }

    /// Landfall proximity, +10 for towers catching stronger winds aloft.
    fn assess(&self, inputs: &ExposureInputs<'_>) -> ExposureResult {
        let mut b = LayerBuilder::new(DataSource::Provider);
        let distance = b.input(
            factor::DISTANCE_TO_COAST_M,
            inputs.building.attribute(
                inputs.building.distance_to_coast_m,
                fallbacks::DISTANCE_TO_COAST_M,
                factor::DISTANCE_TO_COAST_M,
            ),
        );
        let floors = b.input(
            "ground_floors",
            inputs.building.attribute(
                inputs.building.ground_floors,
                fallbacks::GROUND_FLOORS,
                "ground_floors",
            ),
        );
        let (base, tier) = TYPHOON_COAST.classify(distance);
        let height_bonus = if floors >= 10 { 10.0 } else { 0.0 };
        b.number("height_bonus", height_bonus);
        b.finish(Score::new(f64::from(base) + height_bonus), tier)
    }
}

// ── Engine ──────────────────────────────────────────────────────────────

/// Registry of exposure models
pub struct ExposureEngine {
    models: BTreeMap<HazardType, Box<dyn ExposureModel>>,
}

impl ExposureEngine {
    pub fn new() -> Self {
        let mut engine = Self {
            models: BTreeMap::new(),
        };
        engine.register(Box::new(ExtremeHeatExposure));
        engine.register(Box::new(ExtremeColdExposure));
        engine.register(Box::new(DroughtExposure));
        engine.register(Box::new(RiverFloodExposure));
        engine.register(Box::new(UrbanFloodExposure));
        engine.register(Box::new(CoastalFloodExposure));
        engine.register(Box::new(TyphoonExposure));
        engine.register(Box::new(WildfireExposure));
        engine.register(Box::new(WaterStressExposure));
        engine
    }

    pub fn register(&mut self, model: Box<dyn ExposureModel>) {
        self.models.insert(model.hazard_type(), model);
    }

    pub fn model(&self, hazard: HazardType) -> Option<&dyn ExposureModel> {
        self.models.get(&hazard).map(|m| m.as_ref())
    }

    pub fn required_variables(&self, hazard: HazardType) -> &'static [ClimateVariable] {
        self.model(hazard)
            .map(|m| m.required_variables())
            .unwrap_or(&[])
    }

    pub fn assess(
        &self,
        hazard: HazardType,
        inputs: &ExposureInputs<'_>,
    ) -> Option<ExposureResult> {
        self.model(hazard).map(|m| m.assess(inputs))
    }
}

impl Default for ExposureEngine {
    fn default() -> Self {
        Self::new()
    }
}
