//! Typhoon

use types::assessment::{HazardResult, LayerBuilder};
use types::climate::{ClimateFactSet, ClimateVariable};
use types::hazard::HazardType;
use types::score::Score;
use types::site::{BuildingFact, SpatialFact};
use types::sourced::DataSource;

use crate::ladder::{standard, Bound, Ladder, Rung, STANDARD_FLOOR};

/// Wind speed (m/s) at which the wind component starts rising from zero.
const WIND_FLOOR_MS: f64 = 15.0;
/// Span (m/s) over which the wind component rises to 100.
const WIND_SPAN_MS: f64 = 30.0;
const RAIN_SATURATION_MM: f64 = 400.0;
const DURATION_SATURATION_H: f64 = 48.0;

const COMPOSITE_RUNGS: [Rung; 3] = standard(Bound::AtLeast, 70.0, 50.0, 30.0);
const COMPOSITE: Ladder = Ladder::new(Bound::AtLeast, &COMPOSITE_RUNGS, STANDARD_FLOOR);

fn component(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Weighted wind / rain / duration index.
///
/// Duration series are the sparsest input. When only its fallback is
/// available the index is re-weighted over wind and rain instead of mixing in
/// a national constant.
#[derive(Debug, Clone, Copy, Default)]
pub struct TyphoonHazard;

impl super::HazardModel for TyphoonHazard {
    fn hazard_type(&self) -> HazardType {
        HazardType::Typhoon
    }

    fn required_variables(&self) -> &'static [ClimateVariable] {
        &[
            ClimateVariable::MaxWindSpeed,
            ClimateVariable::MaxOneDayPrecip,
            ClimateVariable::StormDuration,
        ]
    }

    fn assess(
        &self,
        climate: &ClimateFactSet,
        _spatial: &SpatialFact,
        _building: &BuildingFact,
    ) -> HazardResult {
        let mut b = LayerBuilder::new(DataSource::Grid);
        let wind_speed = b.climate("max_wind_speed_ms", &climate.get(ClimateVariable::MaxWindSpeed));
        let rx1day = b.climate("rx1day_mm", &climate.get(ClimateVariable::MaxOneDayPrecip));

        let wind = component((wind_speed - WIND_FLOOR_MS) / WIND_SPAN_MS * 100.0);
        let rain = component(rx1day / RAIN_SATURATION_MM * 100.0);
        b.number("wind_component", round2(wind));
        b.number("rain_component", round2(rain));

        let duration_fact = climate.get(ClimateVariable::StormDuration);
        let composite = if duration_fact.is_fallback() {
            // Not consumed, so it does not taint the result; still reported.
            if let Some(warning) = duration_fact.warning() {
                b.warn(warning);
            }
            b.factor("storm_duration_h", serde_json::Value::Null);
            b.factor("weighting", "wind_rain");
            0.6 * wind + 0.4 * rain
        } else {
            let hours = b.climate("storm_duration_h", &duration_fact);
            let duration = component(hours / DURATION_SATURATION_H * 100.0);
            b.number("duration_component", round2(duration));
            b.factor("weighting", "wind_rain_duration");
            0.5 * wind + 0.3 * rain + 0.2 * duration
        };
        let composite = round2(composite);
        b.number("composite_index", composite);

        let (score, tier) = COMPOSITE.classify(composite);
        b.finish(Score::from(score), tier)
    }
}
