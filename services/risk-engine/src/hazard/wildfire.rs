//! Wildfire
//!
//! A simplified fire-weather index from summer heat and dry spell length,
//! adjusted for available fuel and land cover.

use types::assessment::{HazardResult, LayerBuilder};
use types::climate::{ClimateFactSet, ClimateVariable};
use types::hazard::HazardType;
use types::score::{Score, Tier};
use types::site::{BuildingFact, FuelLevel, LandCover, SpatialFact};
use types::sourced::{DataSource, Sourced};

/// Fuel from the provider's classification, else from NDVI, else medium.
pub fn resolve_fuel(spatial: &SpatialFact) -> Sourced<FuelLevel> {
    if let Some(fuel) = spatial.vegetation_fuel {
        return Sourced::resolved(fuel, DataSource::Provider);
    }
    if let Some(ndvi) = spatial.ndvi.filter(|v| v.is_finite()) {
        return Sourced::resolved(FuelLevel::from_ndvi(ndvi), DataSource::Provider);
    }
    Sourced::fallback(
        FuelLevel::Medium,
        spatial.absence("vegetation fuel and NDVI"),
    )
}

/// `max(0, (tmax - 20) * 2 + dry_days)`, one decimal place.
pub fn fire_weather_index(tmax: f64, dry_days: f64) -> f64 {
    let raw = ((tmax - 20.0) * 2.0 + dry_days).max(0.0);
    (raw * 10.0).round() / 10.0
}

fn fuel_adjustment(fuel: FuelLevel) -> f64 {
    match fuel {
        FuelLevel::High => 30.0,
        FuelLevel::Medium => 15.0,
        FuelLevel::Low => 0.0,
    }
}

fn land_cover_adjustment(land_cover: LandCover) -> f64 {
    match land_cover {
        LandCover::Forest => 20.0,
        LandCover::Grassland | LandCover::Cropland => 10.0,
        LandCover::Urban | LandCover::Wetland | LandCover::Barren | LandCover::Water => 0.0,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WildfireHazard;

impl super::HazardModel for WildfireHazard {
    fn hazard_type(&self) -> HazardType {
        HazardType::Wildfire
    }

    fn required_variables(&self) -> &'static [ClimateVariable] {
        &[ClimateVariable::AnnualMaxTemp, ClimateVariable::ConsecutiveDryDays]
    }

    fn assess(
        &self,
        climate: &ClimateFactSet,
        spatial: &SpatialFact,
        _building: &BuildingFact,
    ) -> HazardResult {
        let mut b = LayerBuilder::new(DataSource::Grid);
        let tmax = b.climate("annual_max_temp_c", &climate.get(ClimateVariable::AnnualMaxTemp));
        let dry_days = b.climate(
            "consecutive_dry_days",
            &climate.get(ClimateVariable::ConsecutiveDryDays),
        );

        let fwi = fire_weather_index(tmax, dry_days);
        b.number("fire_weather_index", fwi);

        let fuel = b.input("vegetation_fuel", resolve_fuel(spatial));
        let land_cover = match spatial.land_cover {
            Some(lc) => {
                b.factor("land_cover", serde_json::to_value(lc).unwrap_or_default());
                land_cover_adjustment(lc)
            }
            None => {
                b.factor("land_cover", serde_json::Value::Null);
                b.warn(format!(
                    "land_cover: no land-cover adjustment ({})",
                    spatial.absence("land_cover")
                ));
                b.taint();
                0.0
            }
        };
        let dry_spell = if dry_days > 30.0 { 10.0 } else { 0.0 };

        let risk_index = (fwi + fuel_adjustment(fuel) + land_cover + dry_spell).min(100.0);
        b.number("risk_index", (risk_index * 10.0).round() / 10.0);

        let (score, tier) = if risk_index > 70.0 {
            (85, Tier::VeryHigh)
        } else if risk_index > 50.0 {
            (65, Tier::High)
        } else {
            (40, Tier::Medium)
        };
        b.finish(Score::from(score), tier)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{assess_bare, no_building};
    use super::super::HazardModel;
    use super::*;
    use types::scenario::{Scenario, TargetYear};

    fn facts(tmax: f64, dry_days: f64) -> ClimateFactSet {
        ClimateFactSet::new(Scenario::SSP245, TargetYear::new(2050).unwrap())
            .with_value(ClimateVariable::AnnualMaxTemp, tmax)
            .with_value(ClimateVariable::ConsecutiveDryDays, dry_days)
    }

    fn site(fuel: Option<FuelLevel>, land_cover: Option<LandCover>) -> SpatialFact {
        SpatialFact {
            vegetation_fuel: fuel,
            land_cover,
            ..SpatialFact::default()
        }
    }

    #[test]
    fn test_forest_site_saturates() {
        let result = WildfireHazard.assess(
            &facts(38.3, 37.0),
            &site(Some(FuelLevel::High), Some(LandCover::Forest)),
            &no_building(),
        );
        assert_eq!(result.factor_f64("fire_weather_index"), Some(73.6));
        assert_eq!(result.factor_f64("risk_index"), Some(100.0));
        assert_eq!(result.score, Score::from(85));
        assert_eq!(result.tier, Tier::VeryHigh);
        assert_eq!(result.data_source, DataSource::Grid);
    }

    #[test]
    fn test_fwi_floor_zero() {
        assert_eq!(fire_weather_index(5.0, 3.0), 0.0);
        assert_eq!(fire_weather_index(25.0, 5.0), 15.0);
    }

    #[test]
    fn test_cool_urban_site_medium() {
        let result = WildfireHazard.assess(
            &facts(28.0, 10.0),
            &site(Some(FuelLevel::Low), Some(LandCover::Urban)),
            &no_building(),
        );
        // fwi 26 → risk_index 26
        assert_eq!(result.score, Score::from(40));
        assert_eq!(result.tier, Tier::Medium);
    }

    #[test]
    fn test_high_band() {
        // fwi 36 + medium fuel 15 + grassland 10 = 61
        let result = WildfireHazard.assess(
            &facts(33.0, 10.0),
            &site(Some(FuelLevel::Medium), Some(LandCover::Grassland)),
            &no_building(),
        );
        assert_eq!(result.factor_f64("risk_index"), Some(61.0));
        assert_eq!(result.score, Score::from(65));
    }

    #[test]
    fn test_fuel_resolution_order() {
        let from_ndvi = SpatialFact {
            ndvi: Some(0.7),
            ..SpatialFact::default()
        };
        assert_eq!(resolve_fuel(&from_ndvi).get(), FuelLevel::High);
        assert!(!resolve_fuel(&from_ndvi).is_fallback());

        let explicit = SpatialFact {
            ndvi: Some(0.7),
            vegetation_fuel: Some(FuelLevel::Low),
            ..SpatialFact::default()
        };
        assert_eq!(resolve_fuel(&explicit).get(), FuelLevel::Low);

        let unknown = resolve_fuel(&SpatialFact::default());
        assert_eq!(unknown.get(), FuelLevel::Medium);
        assert!(unknown.is_fallback());
    }

    #[test]
    fn test_missing_site_facts_warn() {
        let result = assess_bare(&WildfireHazard, &facts(30.0, 20.0));
        assert!(result.is_fallback());
        assert_eq!(result.warnings.len(), 2);
    }
}
