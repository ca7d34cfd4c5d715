//! Extreme heat and extreme cold

use types::assessment::{HazardResult, LayerBuilder};
use types::climate::{ClimateFactSet, ClimateVariable};
use types::hazard::HazardType;
use types::score::{Score, Tier};
use types::site::{BuildingFact, SpatialFact};
use types::sourced::DataSource;

use crate::ladder::{rung, standard, Bound, Ladder, Rung, STANDARD_FLOOR};

// ── Extreme heat ────────────────────────────────────────────────────────

const HEATWAVE_RUNGS: [Rung; 3] = standard(Bound::Above, 30.0, 20.0, 10.0);
const HEATWAVE_DAYS: Ladder = Ladder::new(Bound::Above, &HEATWAVE_RUNGS, STANDARD_FLOOR);

/// Heat intensity from the annual count of days with Tmax >= 33°C.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtremeHeatHazard;

impl super::HazardModel for ExtremeHeatHazard {
    fn hazard_type(&self) -> HazardType {
        HazardType::ExtremeHeat
    }

    fn required_variables(&self) -> &'static [ClimateVariable] {
        &[
            ClimateVariable::AnnualMaxTemp,
            ClimateVariable::HeatwaveDays,
            ClimateVariable::TropicalNights,
            ClimateVariable::WarmSpellDuration,
        ]
    }

    fn assess(
        &self,
        climate: &ClimateFactSet,
        _spatial: &SpatialFact,
        _building: &BuildingFact,
    ) -> HazardResult {
        let mut b = LayerBuilder::new(DataSource::Grid);
        b.climate("annual_max_temp_c", &climate.get(ClimateVariable::AnnualMaxTemp));
        let heatwave_days = b.climate("heatwave_days", &climate.get(ClimateVariable::HeatwaveDays));
        b.climate("tropical_nights", &climate.get(ClimateVariable::TropicalNights));
        b.climate(
            "warm_spell_duration",
            &climate.get(ClimateVariable::WarmSpellDuration),
        );

        let (score, tier) = HEATWAVE_DAYS.classify(heatwave_days);
        b.factor("heatwave_intensity", tier.as_str());
        b.finish(Score::from(score), tier)
    }
}

// ── Extreme cold ────────────────────────────────────────────────────────

const COLD_WAVE_RUNGS: [Rung; 3] = standard(Bound::Above, 15.0, 8.0, 3.0);
const COLD_WAVE_DAYS: Ladder = Ladder::new(Bound::Above, &COLD_WAVE_RUNGS, STANDARD_FLOOR);

const MIN_TEMP_RUNGS: [Rung; 2] = [rung(-20.0, 75, Tier::High), rung(-15.0, 50, Tier::Medium)];
const MIN_TEMP: Ladder = Ladder::new(Bound::AtMost, &MIN_TEMP_RUNGS, STANDARD_FLOOR);

/// Cold intensity: the worse of cold-wave frequency and absolute minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtremeColdHazard;

impl super::HazardModel for ExtremeColdHazard {
    fn hazard_type(&self) -> HazardType {
        HazardType::ExtremeCold
    }

    fn required_variables(&self) -> &'static [ClimateVariable] {
        &[
            ClimateVariable::AnnualMinTemp,
            ClimateVariable::ColdWaveDays,
            ClimateVariable::FrostDays,
            ClimateVariable::ColdSpellDuration,
        ]
    }

    fn assess(
        &self,
        climate: &ClimateFactSet,
        _spatial: &SpatialFact,
        _building: &BuildingFact,
    ) -> HazardResult {
        let mut b = LayerBuilder::new(DataSource::Grid);
        let min_temp = b.climate("annual_min_temp_c", &climate.get(ClimateVariable::AnnualMinTemp));
        let cold_wave_days =
            b.climate("cold_wave_days", &climate.get(ClimateVariable::ColdWaveDays));
        b.climate("frost_days", &climate.get(ClimateVariable::FrostDays));
        b.climate(
            "cold_spell_duration",
            &climate.get(ClimateVariable::ColdSpellDuration),
        );

        let by_days = COLD_WAVE_DAYS.classify(cold_wave_days);
        let by_min = MIN_TEMP.classify(min_temp);
        b.factor("cold_wave_intensity", by_days.1.as_str());
        b.factor("min_temp_severity", by_min.1.as_str());

        let (score, tier) = if by_min.0 > by_days.0 {
            b.factor("governing_indicator", "annual_min_temp");
            by_min
        } else {
            b.factor("governing_indicator", "cold_wave_days");
            by_days
        };
        b.finish(Score::from(score), tier)
    }
}
