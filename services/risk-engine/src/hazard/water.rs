//! Drought and water stress

use types::assessment::{HazardResult, LayerBuilder};
use types::climate::{ClimateFactSet, ClimateVariable};
use types::hazard::HazardType;
use types::score::{Score, Tier};
use types::site::{BuildingFact, SpatialFact};
use types::sourced::DataSource;

use crate::ladder::{rung, Bound, Ladder, Rung, STANDARD_FLOOR};

/// Dry spells longer than this add to both indices.
const LONG_DRY_SPELL_DAYS: f64 = 30.0;

// ── Drought ─────────────────────────────────────────────────────────────

// McKee et al. (1993) classes: moderate -1.0, severe -1.5, extreme -2.0
const SPEI_RUNGS: [Rung; 3] = [
    rung(-2.0, 90, Tier::VeryHigh),
    rung(-1.5, 75, Tier::High),
    rung(-1.0, 50, Tier::Medium),
];
const SPEI: Ladder = Ladder::new(Bound::AtMost, &SPEI_RUNGS, STANDARD_FLOOR);

fn drought_class(spei: f64) -> &'static str {
    if spei <= -2.0 {
        "extreme"
    } else if spei <= -1.5 {
        "severe"
    } else if spei <= -1.0 {
        "moderate"
    } else {
        "normal"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DroughtHazard;

impl super::HazardModel for DroughtHazard {
    fn hazard_type(&self) -> HazardType {
        HazardType::Drought
    }

    fn required_variables(&self) -> &'static [ClimateVariable] {
        &[ClimateVariable::Spei12, ClimateVariable::ConsecutiveDryDays]
    }

    fn assess(
        &self,
        climate: &ClimateFactSet,
        _spatial: &SpatialFact,
        _building: &BuildingFact,
    ) -> HazardResult {
        let mut b = LayerBuilder::new(DataSource::Grid);
        let spei = b.climate("spei12", &climate.get(ClimateVariable::Spei12));
        let dry_days = b.climate(
            "consecutive_dry_days",
            &climate.get(ClimateVariable::ConsecutiveDryDays),
        );

        let (base, tier) = SPEI.classify(spei);
        b.factor("drought_class", drought_class(spei));
        let dry_spell_bonus = if dry_days > LONG_DRY_SPELL_DAYS { 10.0 } else { 0.0 };
        b.number("dry_spell_bonus", dry_spell_bonus);

        b.finish(Score::new(f64::from(base) + dry_spell_bonus), tier)
    }
}

// ── Water stress ────────────────────────────────────────────────────────

/// National mean annual precipitation (mm) the ratio is taken against.
pub const REFERENCE_PRECIPITATION_MM: f64 = 1300.0;

const RATIO_RUNGS: [Rung; 3] = [
    rung(0.6, 90, Tier::VeryHigh),
    rung(0.8, 75, Tier::High),
    rung(1.0, 50, Tier::Medium),
];
const PRECIPITATION_RATIO: Ladder = Ladder::new(Bound::Below, &RATIO_RUNGS, STANDARD_FLOOR);

/// Mean temperatures above this raise evaporative demand.
const WARM_MEAN_TEMP_C: f64 = 16.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct WaterStressHazard;

impl super::HazardModel for WaterStressHazard {
    fn hazard_type(&self) -> HazardType {
        HazardType::WaterStress
    }

    fn required_variables(&self) -> &'static [ClimateVariable] {
        &[
            ClimateVariable::AnnualPrecipitation,
            ClimateVariable::ConsecutiveDryDays,
            ClimateVariable::AnnualMeanTemp,
        ]
    }

    fn assess(
        &self,
        climate: &ClimateFactSet,
        _spatial: &SpatialFact,
        _building: &BuildingFact,
    ) -> HazardResult {
        let mut b = LayerBuilder::new(DataSource::Grid);
        let precipitation = b.climate(
            "annual_precipitation_mm",
            &climate.get(ClimateVariable::AnnualPrecipitation),
        );
        let dry_days = b.climate(
            "consecutive_dry_days",
            &climate.get(ClimateVariable::ConsecutiveDryDays),
        );
        let mean_temp = b.climate("annual_mean_temp_c", &climate.get(ClimateVariable::AnnualMeanTemp));

        let ratio = precipitation / REFERENCE_PRECIPITATION_MM;
        b.number("precipitation_ratio", (ratio * 1000.0).round() / 1000.0);
        let (base, tier) = PRECIPITATION_RATIO.classify(ratio);

        let mut bonus = 0.0;
        if dry_days > LONG_DRY_SPELL_DAYS {
            bonus += 10.0;
        }
        if mean_temp > WARM_MEAN_TEMP_C {
            bonus += 5.0;
        }
        b.number("climate_bonus", bonus);

        b.finish(Score::new(f64::from(base) + bonus), tier)
    }
}
