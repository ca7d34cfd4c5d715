//! River, urban (pluvial) and coastal flooding

use types::assessment::{HazardResult, LayerBuilder};
use types::climate::{ClimateFactSet, ClimateVariable};
use types::hazard::HazardType;
use types::score::{Score, Tier};
use types::site::{fallbacks, BuildingFact, SpatialFact};
use types::sourced::DataSource;

use crate::ladder::{standard, Bound, Ladder, Rung, STANDARD_FLOOR};

// ── River flood ─────────────────────────────────────────────────────────

const RX5DAY_RUNGS: [Rung; 3] = standard(Bound::AtLeast, 500.0, 350.0, 200.0);
const RX5DAY: Ladder = Ladder::new(Bound::AtLeast, &RX5DAY_RUNGS, STANDARD_FLOOR);

/// Larger Strahler orders drain larger catchments.
fn stream_order_bonus(order: u8) -> f64 {
    match order {
        5.. => 10.0,
        3..=4 => 5.0,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RiverFloodHazard;

impl super::HazardModel for RiverFloodHazard {
    fn hazard_type(&self) -> HazardType {
        HazardType::RiverFlood
    }

    fn required_variables(&self) -> &'static [ClimateVariable] {
        &[
            ClimateVariable::MaxOneDayPrecip,
            ClimateVariable::MaxFiveDayPrecip,
            ClimateVariable::HeavyRainDays,
        ]
    }

    fn assess(
        &self,
        climate: &ClimateFactSet,
        spatial: &SpatialFact,
        _building: &BuildingFact,
    ) -> HazardResult {
        let mut b = LayerBuilder::new(DataSource::Grid);
        b.climate("rx1day_mm", &climate.get(ClimateVariable::MaxOneDayPrecip));
        let rx5day = b.climate("rx5day_mm", &climate.get(ClimateVariable::MaxFiveDayPrecip));
        b.climate("heavy_rain_days", &climate.get(ClimateVariable::HeavyRainDays));
        let stream_order = b.input(
            "stream_order",
            spatial.attribute(spatial.stream_order, fallbacks::STREAM_ORDER, "stream_order"),
        );

        let (base, tier) = RX5DAY.classify(rx5day);
        let bonus = stream_order_bonus(stream_order);
        b.number("stream_order_bonus", bonus);
        b.finish(Score::new(f64::from(base) + bonus), tier)
    }
}

// ── Urban flood ─────────────────────────────────────────────────────────

const RAIN80_RUNGS: [Rung; 3] = standard(Bound::Above, 5.0, 3.0, 1.0);
const RAIN80: Ladder = Ladder::new(Bound::Above, &RAIN80_RUNGS, STANDARD_FLOOR);

/// A single day this wet overwhelms typical urban drainage design capacity.
const EXTREME_DAILY_RAIN_MM: f64 = 250.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct UrbanFloodHazard;

impl super::HazardModel for UrbanFloodHazard {
    fn hazard_type(&self) -> HazardType {
        HazardType::UrbanFlood
    }

    fn required_variables(&self) -> &'static [ClimateVariable] {
        &[
            ClimateVariable::MaxOneDayPrecip,
            ClimateVariable::HeavyRainDays,
            ClimateVariable::PrecipIntensity,
        ]
    }

    fn assess(
        &self,
        climate: &ClimateFactSet,
        _spatial: &SpatialFact,
        _building: &BuildingFact,
    ) -> HazardResult {
        let mut b = LayerBuilder::new(DataSource::Grid);
        let rx1day = b.climate("rx1day_mm", &climate.get(ClimateVariable::MaxOneDayPrecip));
        let heavy_days = b.climate("heavy_rain_days", &climate.get(ClimateVariable::HeavyRainDays));
        b.climate("precip_intensity_mm_day", &climate.get(ClimateVariable::PrecipIntensity));

        let (mut score, mut tier) = RAIN80.classify(heavy_days);
        let uplift = rx1day >= EXTREME_DAILY_RAIN_MM && score < 75;
        if uplift {
            score = 75;
            tier = Tier::High;
        }
        b.factor("extreme_daily_rain_uplift", uplift);
        b.finish(Score::from(score), tier)
    }
}

// ── Coastal flood ───────────────────────────────────────────────────────

const SLR_RUNGS: [Rung; 3] = standard(Bound::AtLeast, 1.0, 0.6, 0.3);
const SEA_LEVEL_RISE: Ladder = Ladder::new(Bound::AtLeast, &SLR_RUNGS, STANDARD_FLOOR);

#[derive(Debug, Clone, Copy, Default)]
pub struct CoastalFloodHazard;

impl super::HazardModel for CoastalFloodHazard {
    fn hazard_type(&self) -> HazardType {
        HazardType::CoastalFlood
    }

    fn required_variables(&self) -> &'static [ClimateVariable] {
        &[ClimateVariable::SeaLevelRise]
    }

    fn assess(
        &self,
        climate: &ClimateFactSet,
        _spatial: &SpatialFact,
        _building: &BuildingFact,
    ) -> HazardResult {
        let mut b = LayerBuilder::new(DataSource::Grid);
        let slr = b.climate("sea_level_rise_m", &climate.get(ClimateVariable::SeaLevelRise));
        let (score, tier) = SEA_LEVEL_RISE.classify(slr);
        b.finish(Score::from(score), tier)
    }
}
