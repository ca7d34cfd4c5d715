//! Composed risk scores and the per-location report

use crate::assessment::VulnerabilityResult;
use crate::geo::GeoPoint;
use crate::hazard::HazardType;
use crate::scenario::{Scenario, TargetYear};
use crate::score::{ScenarioLevel, Score, Tier};
use crate::site::{BuildingFact, SpatialFact};
use crate::sourced::DataSource;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Composition formula recorded in report metadata
pub const RISK_FORMULA: &str = "risk = H x E x V / 10000";

/// Risk for one (hazard, scenario, year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub hazard_type: HazardType,
    pub scenario: Scenario,
    pub year: TargetYear,
    pub hazard_score: Score,
    pub exposure_score: Score,
    pub vulnerability_score: Score,
    pub risk_score: Score,
    pub risk_level: Tier,
    pub hazard_tier: Tier,
    /// Distinct sources behind the three layers, e.g. `"hazard:grid"`
    pub data_sources: Vec<String>,
    #[serde(rename = "tcfd_warnings")]
    pub warnings: Vec<String>,
}

impl RiskScore {
    /// Compose `H × E × V / 10000` and classify it.
    pub fn compose(
        hazard_type: HazardType,
        scenario: Scenario,
        year: TargetYear,
        hazard: Score,
        exposure: Score,
        vulnerability: Score,
    ) -> Self {
        let risk_score = Score::compose(hazard, exposure, vulnerability);
        Self {
            hazard_type,
            scenario,
            year,
            hazard_score: hazard,
            exposure_score: exposure,
            vulnerability_score: vulnerability,
            risk_score,
            risk_level: Tier::from_score(risk_score),
            hazard_tier: Tier::Low,
            data_sources: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// True when any layer fell back.
    pub fn is_degraded(&self) -> bool {
        self.data_sources
            .iter()
            .any(|s| s.ends_with(DataSource::Fallback.as_str()))
    }
}

/// All hazards for one scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRisk {
    pub risks: BTreeMap<HazardType, RiskScore>,
    /// Sum of the hazard risk scores (0..900)
    pub total_score: Decimal,
    pub mean_score: Score,
    pub risk_level: ScenarioLevel,
}

impl ScenarioRisk {
    pub fn from_risks(risks: BTreeMap<HazardType, RiskScore>) -> Self {
        let total_score: Decimal = risks.values().map(|r| r.risk_score.as_decimal()).sum();
        let mean_score = if risks.is_empty() {
            Score::ZERO
        } else {
            Score::from_decimal(
                (total_score / Decimal::from(risks.len() as u64)).round_dp(2),
            )
        };
        Self {
            risks,
            total_score,
            mean_score,
            risk_level: ScenarioLevel::from(Tier::from_score(mean_score)),
        }
    }

    pub fn get(&self, hazard: HazardType) -> Option<&RiskScore> {
        self.risks.get(&hazard)
    }
}

/// Site facts as supplied by the collaborators, with their provenance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteProfile {
    pub building: BuildingFact,
    pub building_source: Option<DataSource>,
    pub spatial: SpatialFact,
    pub spatial_source: Option<DataSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub engine_version: String,
    pub formula: String,
    pub scenarios: Vec<Scenario>,
    pub hazards: Vec<HazardType>,
    /// Number of H/E/V results that used at least one fallback
    pub fallback_count: usize,
}

impl ReportMetadata {
    pub fn new(engine_version: impl Into<String>, scenarios: Vec<Scenario>) -> Self {
        Self {
            report_id: Uuid::now_v7(),
            generated_at: Utc::now(),
            engine_version: engine_version.into(),
            formula: RISK_FORMULA.to_string(),
            scenarios,
            hazards: HazardType::ALL.to_vec(),
            fallback_count: 0,
        }
    }
}

/// One location, one year, the requested scenarios, all nine hazards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub location: GeoPoint,
    pub target_year: TargetYear,
    pub scenarios: BTreeMap<Scenario, ScenarioRisk>,
    pub exposure: SiteProfile,
    pub vulnerability: BTreeMap<HazardType, VulnerabilityResult>,
    pub metadata: ReportMetadata,
    pub warnings: Vec<String>,
}

impl RiskReport {
    pub fn risk(&self, scenario: Scenario, hazard: HazardType) -> Option<&RiskScore> {
        self.scenarios.get(&scenario).and_then(|s| s.get(hazard))
    }

    /// Every composed score in the report.
    pub fn all_risks(&self) -> impl Iterator<Item = &RiskScore> {
        self.scenarios.values().flat_map(|s| s.risks.values())
    }

    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}
