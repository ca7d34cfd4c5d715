//! Risk composer — orchestrator
//!
//! Ties together grid access, the three layer engines and the site
//! collaborators: for every requested scenario and all nine hazards it runs
//! H → E → V and composes `risk = H × E × V / 10000`.
//!
//! Only request validation fails a composition. Everything else degrades to
//! documented fallbacks and shows up in the warnings.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use types::assessment::{ExposureResult, HazardResult, LayerResult, VulnerabilityResult};
use types::climate::ClimateVariable;
use types::errors::RiskError;
use types::geo::GeoPoint;
use types::hazard::HazardType;
use types::report::{ReportMetadata, RiskReport, RiskScore, ScenarioRisk, SiteProfile};
use types::scenario::{Scenario, TargetYear};
use types::site::{BuildingFact, SpatialFact};
use types::sourced::DataSource;

use crate::config::EngineConfig;
use crate::exposure::{ExposureEngine, ExposureInputs};
use crate::grid::GridDataAccessor;
use crate::hazard::HazardEngine;
use crate::providers::{
    BuildingAttributeProvider, Geocoder, SpatialAttributeProvider, Unavailable,
};
use crate::validator;
use crate::vulnerability::{VulnerabilityEngine, VulnerabilityInputs};

/// H, E and V for one (scenario, hazard)
#[derive(Debug, Clone, PartialEq)]
pub struct HazardAssessment {
    pub hazard: HazardResult,
    pub exposure: ExposureResult,
    pub vulnerability: VulnerabilityResult,
}

impl HazardAssessment {
    /// Compose the three layers into a classified risk score.
    pub fn compose(&self, hazard_type: HazardType, scenario: Scenario, year: TargetYear) -> RiskScore {
        let mut risk = RiskScore::compose(
            hazard_type,
            scenario,
            year,
            self.hazard.score,
            self.exposure.score,
            self.vulnerability.score,
        );
        risk.hazard_tier = self.hazard.tier;
        risk.data_sources = vec![
            format!("hazard:{}", self.hazard.data_source),
            format!("exposure:{}", self.exposure.data_source),
            format!("vulnerability:{}", self.vulnerability.data_source),
        ];
        for (layer, result) in self.layers() {
            for warning in &result.warnings {
                push_unique(&mut risk.warnings, format!("{}: {}", layer, warning));
            }
        }
        risk
    }

    fn layers(&self) -> [(&'static str, &LayerResult); 3] {
        [
            ("hazard", &self.hazard),
            ("exposure", &self.exposure),
            ("vulnerability", &self.vulnerability),
        ]
    }

    /// Number of layers that consumed a fallback.
    pub fn fallback_count(&self) -> usize {
        self.layers().iter().filter(|(_, r)| r.is_fallback()).count()
    }
}

fn push_unique(warnings: &mut Vec<String>, warning: String) {
    if !warnings.contains(&warning) {
        warnings.push(warning);
    }
}

/// Risk composition service
pub struct RiskComposer {
    config: EngineConfig,
    grid: GridDataAccessor,
    hazards: HazardEngine,
    exposures: ExposureEngine,
    vulnerabilities: VulnerabilityEngine,
    spatial: Arc<dyn SpatialAttributeProvider>,
    buildings: Arc<dyn BuildingAttributeProvider>,
    geocoder: Arc<dyn Geocoder>,
}

impl RiskComposer {
    /// Composer with default configuration plus environment overrides and no
    /// site collaborators.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default().with_env_overrides())
    }

    /// Composer reading archives under `config.archive_root` with its own
    /// dataset cache.
    pub fn with_config(config: EngineConfig) -> Self {
        let grid = GridDataAccessor::from_root(config.archive_root.clone());
        Self {
            config,
            grid,
            hazards: HazardEngine::new(),
            exposures: ExposureEngine::new(),
            vulnerabilities: VulnerabilityEngine::new(),
            spatial: Arc::new(Unavailable),
            buildings: Arc::new(Unavailable),
            geocoder: Arc::new(Unavailable),
        }
    }

    /// Replace the grid accessor (e.g. to share a cache between composers).
    pub fn with_grid(mut self, grid: GridDataAccessor) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_spatial_provider(mut self, provider: Arc<dyn SpatialAttributeProvider>) -> Self {
        self.spatial = provider;
        self
    }

    pub fn with_building_provider(mut self, provider: Arc<dyn BuildingAttributeProvider>) -> Self {
        self.buildings = provider;
        self
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = geocoder;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridDataAccessor {
        &self.grid
    }

    pub fn hazards_mut(&mut self) -> &mut HazardEngine {
        &mut self.hazards
    }

    /// Compose the report for one point, one year and the given scenarios.
    pub fn compose(
        &self,
        point: GeoPoint,
        year: i32,
        scenarios: &[Scenario],
    ) -> Result<RiskReport, RiskError> {
        let request = validator::validate_request(point, year, scenarios)?;
        let point = request.point;
        let year = request.year;

        info!(
            lat = point.lat(),
            lon = point.lon(),
            year = year.value(),
            scenarios = request.scenarios.len(),
            "Composing risk report"
        );

        let mut report_warnings = Vec::new();
        let site = self.site_profile(point, &mut report_warnings);

        let mut scenario_risks = BTreeMap::new();
        let mut vulnerability = BTreeMap::new();
        let mut fallback_count = 0;

        for &scenario in &request.scenarios {
            let mut risks = BTreeMap::new();
            for hazard_type in HazardType::ALL {
                let Some(assessment) = self.assess(hazard_type, scenario, point, year, &site) else {
                    warn!(hazard = %hazard_type, "No model registered, hazard skipped");
                    push_unique(
                        &mut report_warnings,
                        format!("{}: no model registered", hazard_type),
                    );
                    continue;
                };

                fallback_count += assessment.fallback_count();
                let risk = assessment.compose(hazard_type, scenario, year);
                debug!(
                    scenario = %scenario,
                    hazard = %hazard_type,
                    hazard_score = %risk.hazard_score,
                    exposure_score = %risk.exposure_score,
                    vulnerability_score = %risk.vulnerability_score,
                    risk_score = %risk.risk_score,
                    "Hazard composed"
                );

                for layer in assessment.layers().iter().map(|(_, r)| r) {
                    for warning in &layer.warnings {
                        push_unique(&mut report_warnings, warning.clone());
                    }
                }
                vulnerability
                    .entry(hazard_type)
                    .or_insert_with(|| assessment.vulnerability.clone());
                risks.insert(hazard_type, risk);
            }
            scenario_risks.insert(scenario, ScenarioRisk::from_risks(risks));
        }

        let mut metadata = ReportMetadata::new(crate::ENGINE_VERSION, request.scenarios.clone());
        metadata.fallback_count = fallback_count;

        info!(
            lat = point.lat(),
            lon = point.lon(),
            year = year.value(),
            fallback_layers = fallback_count,
            warnings = report_warnings.len(),
            "Risk report composed"
        );

        Ok(RiskReport {
            location: point,
            target_year: year,
            scenarios: scenario_risks,
            exposure: site,
            vulnerability,
            metadata,
            warnings: report_warnings,
        })
    }

    /// Compose for the configured default scenarios.
    pub fn compose_default(&self, point: GeoPoint, year: i32) -> Result<RiskReport, RiskError> {
        self.compose(point, year, &self.config.default_scenarios)
    }

    /// Compose for raw coordinates; invalid coordinates fail validation.
    pub fn compose_at(
        &self,
        lat: f64,
        lon: f64,
        year: i32,
        scenarios: &[Scenario],
    ) -> Result<RiskReport, RiskError> {
        self.compose(GeoPoint::new(lat, lon)?, year, scenarios)
    }

    /// Geocode `address`, then compose. Geocoding failures are location errors.
    pub fn compose_address(
        &self,
        address: &str,
        scenarios: &[Scenario],
        year: i32,
    ) -> Result<RiskReport, RiskError> {
        let point = self.geocoder.geocode(address).map_err(|e| {
            warn!(address = %address, error = %e, "Geocoding failed");
            RiskError::unresolved_location(format!("could not geocode '{}': {}", address, e))
        })?;
        self.compose(point, year, scenarios)
    }

    /// H → E → V for one hazard. `None` only when a layer has no model.
    pub fn assess(
        &self,
        hazard_type: HazardType,
        scenario: Scenario,
        point: GeoPoint,
        year: TargetYear,
        site: &SiteProfile,
    ) -> Option<HazardAssessment> {
        let variables = self.variables_for(hazard_type);
        let climate = self.grid.resolve_set(scenario, &variables, point, year);

        let hazard = self
            .hazards
            .assess(hazard_type, &climate, &site.spatial, &site.building)?;
        let exposure = self.exposures.assess(
            hazard_type,
            &ExposureInputs {
                building: &site.building,
                spatial: &site.spatial,
                climate: &climate,
            },
        )?;
        let injected = VulnerabilityEngine::takes_exposure(hazard_type).then_some(&exposure);
        let vulnerability = self.vulnerabilities.assess(
            hazard_type,
            &VulnerabilityInputs {
                building: &site.building,
                spatial: &site.spatial,
                exposure: injected,
            },
        )?;

        Some(HazardAssessment {
            hazard,
            exposure,
            vulnerability,
        })
    }

    /// Climate variables the hazard and exposure models read, de-duplicated.
    fn variables_for(&self, hazard_type: HazardType) -> Vec<ClimateVariable> {
        let mut variables: Vec<ClimateVariable> = self.hazards.required_variables(hazard_type).to_vec();
        for &variable in self.exposures.required_variables(hazard_type) {
            if !variables.contains(&variable) {
                variables.push(variable);
            }
        }
        variables
    }

    /// Fetch building and spatial facts once per report. Collaborator errors
    /// leave every attribute absent.
    pub fn site_profile(&self, point: GeoPoint, warnings: &mut Vec<String>) -> SiteProfile {
        let mut site = SiteProfile::default();

        match self.buildings.building_facts(point) {
            Ok(building) => {
                site.building = building;
                site.building_source = Some(DataSource::Provider);
            }
            Err(e) => {
                warn!(lat = point.lat(), lon = point.lon(), error = %e, "Building attributes unavailable");
                warnings.push(format!("building attributes unavailable: {}", e));
                site.building = BuildingFact::unavailable(e.to_string());
                site.building_source = Some(DataSource::Fallback);
            }
        }

        match self.spatial.spatial_facts(point) {
            Ok(spatial) => {
                site.spatial = spatial;
                site.spatial_source = Some(DataSource::Provider);
            }
            Err(e) => {
                warn!(lat = point.lat(), lon = point.lon(), error = %e, "Spatial attributes unavailable");
                warnings.push(format!("spatial attributes unavailable: {}", e));
                site.spatial = SpatialFact::unavailable(e.to_string());
                site.spatial_source = Some(DataSource::Fallback);
            }
        }

        site
    }
}

impl Default for RiskComposer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::archive::{ArchiveWriter, ClimateGrid};
    use crate::providers::{AddressBook, StaticSite};
    use rust_decimal::Decimal;
    use tempfile::TempDir;
    use types::score::{Score, Tier};
    use types::site::{LandCover, StructureType};

    fn seoul() -> GeoPoint {
        GeoPoint::new(37.5665, 126.978).unwrap()
    }

    fn config(root: &TempDir) -> EngineConfig {
        EngineConfig::default().with_archive_root(root.path())
    }

    /// Uniform 2×2 grid, 80 years, every cell `value`.
    fn uniform(scenario: Scenario, variable: ClimateVariable, value: f32) -> ClimateGrid {
        ClimateGrid::new(
            scenario,
            variable,
            vec![37.0, 38.0],
            vec![126.5, 127.5],
            vec![value; 80 * 4],
        )
    }

    fn site() -> StaticSite {
        StaticSite::new(
            BuildingFact {
                ground_floors: Some(8),
                basement_floors: Some(1),
                structure: Some(StructureType::ReinforcedConcrete),
                age_years: Some(32),
                purpose: Some(types::site::BuildingPurpose::Office),
                total_floor_area_m2: Some(4200.0),
                has_piloti: Some(false),
                has_water_tank: Some(true),
                water_dependency: None,
                distance_to_river_m: Some(350.0),
                distance_to_coast_m: Some(25_000.0),
                flood_history_count: Some(2),
                provider_failure: None,
            },
            SpatialFact {
                land_cover: Some(LandCover::Urban),
                ndvi: Some(0.2),
                soil_moisture: Some(0.3),
                elevation_m: Some(38.0),
                stream_order: Some(5),
                impervious_ratio: Some(0.82),
                distance_to_forest_m: Some(1200.0),
                vegetation_fuel: None,
                provider_failure: None,
            },
        )
    }

    fn composer(root: &TempDir) -> RiskComposer {
        let site = Arc::new(site());
        RiskComposer::with_config(config(root))
            .with_building_provider(site.clone())
            .with_spatial_provider(site)
    }

    #[test]
    fn test_compose_without_archives_degrades() {
        let tmp = TempDir::new().unwrap();
        let report = composer(&tmp)
            .compose(seoul(), 2050, &[Scenario::SSP245])
            .unwrap();

        assert_eq!(report.scenarios.len(), 1);
        let risks = &report.scenarios[&Scenario::SSP245].risks;
        assert_eq!(risks.len(), 9);
        for risk in risks.values() {
            assert!(risk.data_sources.contains(&"hazard:fallback".to_string()));
            assert!(!risk.warnings.is_empty());
            assert!(risk.is_degraded());
        }
        assert!(report.is_degraded());
        assert!(report.metadata.fallback_count >= 9);
    }

    #[test]
    fn test_compose_identity_holds() {
        let tmp = TempDir::new().unwrap();
        let report = composer(&tmp)
            .compose(seoul(), 2040, &Scenario::ALL)
            .unwrap();
        for risk in report.all_risks() {
            let expected = risk.hazard_score.as_decimal()
                * risk.exposure_score.as_decimal()
                * risk.vulnerability_score.as_decimal()
                / Decimal::from(10_000);
            assert_eq!(risk.risk_score.as_decimal(), expected);
            assert_eq!(risk.risk_level, Tier::from_score(risk.risk_score));
        }
    }

    #[test]
    fn test_compose_uses_grid_values() {
        let tmp = TempDir::new().unwrap();
        let writer = ArchiveWriter::new(tmp.path());
        for (variable, value) in [
            (ClimateVariable::AnnualMaxTemp, 38.3f32),
            (ClimateVariable::HeatwaveDays, 154.0),
            (ClimateVariable::TropicalNights, 40.0),
            (ClimateVariable::WarmSpellDuration, 25.0),
        ] {
            writer.write(&uniform(Scenario::SSP585, variable, value)).unwrap();
        }

        let report = composer(&tmp)
            .compose(seoul(), 2080, &[Scenario::SSP585])
            .unwrap();
        let heat = report.risk(Scenario::SSP585, HazardType::ExtremeHeat).unwrap();
        assert_eq!(heat.hazard_score, Score::from(90));
        assert_eq!(heat.hazard_tier, Tier::VeryHigh);
        assert_eq!(heat.data_sources[0], "hazard:grid");
        // urban 80 + sealed 10; RC 40 + age 20
        assert_eq!(heat.exposure_score, Score::from(90));
        assert_eq!(heat.vulnerability_score, Score::from(60));
        assert_eq!(heat.risk_score.as_decimal(), Decimal::from_str_exact("48.6").unwrap());
        assert_eq!(heat.risk_level, Tier::Medium);
    }

    #[test]
    fn test_flood_vulnerability_sees_exposure() {
        let tmp = TempDir::new().unwrap();
        let report = composer(&tmp)
            .compose(seoul(), 2050, &[Scenario::SSP126])
            .unwrap();
        let river = &report.vulnerability[&HazardType::RiverFlood];
        assert_eq!(river.factor_f64("distance_to_river_m"), Some(350.0));
        // 50 + basement 30 + age 20 + proximity 10
        assert_eq!(river.score, Score::MAX);
        let urban = &report.vulnerability[&HazardType::UrbanFlood];
        assert!(urban.factors.get("distance_to_river_m").is_none());
    }

    #[test]
    fn test_provider_failure_is_warning() {
        let tmp = TempDir::new().unwrap();
        let report = RiskComposer::with_config(config(&tmp))
            .compose(seoul(), 2030, &[Scenario::SSP126])
            .unwrap();
        assert_eq!(report.exposure.building_source, Some(DataSource::Fallback));
        assert!(report
            .warnings
            .iter()
            .any(|w| w.starts_with("building attributes unavailable")));
        let wildfire = report.risk(Scenario::SSP126, HazardType::Wildfire).unwrap();
        assert!(wildfire.data_sources.contains(&"vulnerability:fallback".to_string()));
    }

    #[test]
    fn test_provider_failure_tags_attributes_as_collaborator_failure() {
        let tmp = TempDir::new().unwrap();
        let report = RiskComposer::with_config(config(&tmp))
            .compose(seoul(), 2030, &[Scenario::SSP126])
            .unwrap();
        assert!(report.exposure.building.provider_failure.is_some());
        assert!(report.exposure.spatial.provider_failure.is_some());

        let heat = report.risk(Scenario::SSP126, HazardType::ExtremeHeat).unwrap();
        assert!(
            heat.warnings
                .iter()
                .any(|w| w.contains("land_cover: fallback used (collaborator failure")),
            "{:?}",
            heat.warnings
        );
        assert!(!heat
            .warnings
            .iter()
            .any(|w| w.contains("land_cover missing")));
    }

    #[test]
    fn test_missing_attribute_from_working_provider_is_data_unavailable() {
        let tmp = TempDir::new().unwrap();
        let empty = Arc::new(StaticSite::new(BuildingFact::default(), SpatialFact::default()));
        let report = RiskComposer::with_config(config(&tmp))
            .with_building_provider(empty.clone())
            .with_spatial_provider(empty)
            .compose(seoul(), 2030, &[Scenario::SSP126])
            .unwrap();
        let heat = report.risk(Scenario::SSP126, HazardType::ExtremeHeat).unwrap();
        assert!(heat
            .warnings
            .iter()
            .any(|w| w.contains("land_cover: fallback used (data unavailable: land_cover missing)")));
        assert!(!heat.warnings.iter().any(|w| w.contains("collaborator failure")));
    }

    #[test]
    fn test_validation_errors_propagate() {
        let tmp = TempDir::new().unwrap();
        let composer = composer(&tmp);
        assert!(matches!(
            composer.compose(seoul(), 2020, &Scenario::ALL),
            Err(RiskError::OutOfRangeYear { .. })
        ));
        assert!(matches!(
            composer.compose(seoul(), 2050, &[]),
            Err(RiskError::EmptyScenarioSet)
        ));
        assert!(matches!(
            composer.compose_at(48.85, 2.35, 2050, &Scenario::ALL),
            Err(RiskError::InvalidLocation { .. })
        ));
    }

    #[test]
    fn test_compose_address() {
        let tmp = TempDir::new().unwrap();
        let book = AddressBook::new().with_entry("Sejong-daero 110", seoul());
        let composer = composer(&tmp).with_geocoder(Arc::new(book));

        let report = composer
            .compose_address("Sejong-daero 110", &[Scenario::SSP370], 2060)
            .unwrap();
        assert_eq!(report.location, seoul());

        let err = composer
            .compose_address("Nowhere-gil 9", &[Scenario::SSP370], 2060)
            .unwrap_err();
        assert!(matches!(err, RiskError::InvalidLocation { .. }));
    }

    #[test]
    fn test_scenario_aggregates_and_metadata() {
        let tmp = TempDir::new().unwrap();
        let report = composer(&tmp)
            .compose(seoul(), 2050, &[Scenario::SSP245, Scenario::SSP245])
            .unwrap();
        assert_eq!(report.metadata.scenarios, vec![Scenario::SSP245]);
        assert_eq!(report.metadata.engine_version, crate::ENGINE_VERSION);
        let scenario = &report.scenarios[&Scenario::SSP245];
        let sum: Decimal = scenario.risks.values().map(|r| r.risk_score.as_decimal()).sum();
        assert_eq!(scenario.total_score, sum);
        assert_eq!(report.vulnerability.len(), 9);
    }

    // ── Defaults and registry ──

    #[test]
    fn test_compose_default_uses_configured_scenarios() {
        let tmp = TempDir::new().unwrap();
        let mut config = config(&tmp);
        config.default_scenarios = vec![Scenario::SSP126, Scenario::SSP585];
        let report = RiskComposer::with_config(config)
            .compose_default(seoul(), 2050)
            .unwrap();
        let keys: Vec<Scenario> = report.scenarios.keys().copied().collect();
        assert_eq!(keys, vec![Scenario::SSP126, Scenario::SSP585]);
        assert_eq!(
            report.metadata.scenarios,
            vec![Scenario::SSP126, Scenario::SSP585]
        );
    }

    #[test]
    fn test_compose_default_rejects_empty_scenarios() {
        let tmp = TempDir::new().unwrap();
        let mut config = config(&tmp);
        config.default_scenarios = Vec::new();
        assert!(matches!(
            RiskComposer::with_config(config).compose_default(seoul(), 2050),
            Err(RiskError::EmptyScenarioSet)
        ));
    }

    #[test]
    fn test_unregistered_hazard_skipped_with_warning() {
        let tmp = TempDir::new().unwrap();
        let mut composer = composer(&tmp);
        assert!(composer.hazards_mut().deregister(HazardType::Typhoon).is_some());

        let report = composer
            .compose(seoul(), 2050, &[Scenario::SSP245])
            .unwrap();
        let risks = &report.scenarios[&Scenario::SSP245].risks;
        assert_eq!(risks.len(), 8);
        assert!(!risks.contains_key(&HazardType::Typhoon));
        assert!(!report.vulnerability.contains_key(&HazardType::Typhoon));
        assert!(report
            .warnings
            .contains(&"typhoon: no model registered".to_string()));
    }

    #[test]
    fn test_report_warnings_deduplicated() {
        let tmp = TempDir::new().unwrap();
        let report = RiskComposer::with_config(config(&tmp))
            .compose(seoul(), 2050, &Scenario::ALL)
            .unwrap();
        let mut sorted = report.warnings.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), report.warnings.len());
    }
}
