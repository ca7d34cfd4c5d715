//! Climate variables and resolved climate facts

use crate::scenario::{Scenario, TargetYear};
use crate::sourced::{DataSource, FallbackReason, Sourced};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Gridded climate variable catalog.
///
/// Each variable maps to one archive per scenario. The fallback constant is
/// the national 2021-2100 ensemble mean, used whenever the archive cannot
/// answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimateVariable {
    AnnualMeanTemp,
    AnnualMaxTemp,
    AnnualMinTemp,
    /// Days with Tmax >= 33°C
    HeatwaveDays,
    /// Nights with Tmin >= 25°C
    TropicalNights,
    WarmSpellDuration,
    /// Days with Tmin <= -12°C
    ColdWaveDays,
    FrostDays,
    IceDays,
    ColdSpellDuration,
    AnnualPrecipitation,
    MaxOneDayPrecip,
    MaxFiveDayPrecip,
    /// Days with >= 80mm precipitation
    HeavyRainDays,
    PrecipIntensity,
    ConsecutiveDryDays,
    Spei12,
    MaxWindSpeed,
    StormDuration,
    SeaLevelRise,
}

impl ClimateVariable {
    pub const ALL: [ClimateVariable; 20] = [
        ClimateVariable::AnnualMeanTemp,
        ClimateVariable::AnnualMaxTemp,
        ClimateVariable::AnnualMinTemp,
        ClimateVariable::HeatwaveDays,
        ClimateVariable::TropicalNights,
        ClimateVariable::WarmSpellDuration,
        ClimateVariable::ColdWaveDays,
        ClimateVariable::FrostDays,
        ClimateVariable::IceDays,
        ClimateVariable::ColdSpellDuration,
        ClimateVariable::AnnualPrecipitation,
        ClimateVariable::MaxOneDayPrecip,
        ClimateVariable::MaxFiveDayPrecip,
        ClimateVariable::HeavyRainDays,
        ClimateVariable::PrecipIntensity,
        ClimateVariable::ConsecutiveDryDays,
        ClimateVariable::Spei12,
        ClimateVariable::MaxWindSpeed,
        ClimateVariable::StormDuration,
        ClimateVariable::SeaLevelRise,
    ];

    /// Code used in archive file names.
    pub fn code(&self) -> &'static str {
        match self {
            ClimateVariable::AnnualMeanTemp => "TA",
            ClimateVariable::AnnualMaxTemp => "TXX",
            ClimateVariable::AnnualMinTemp => "TNN",
            ClimateVariable::HeatwaveDays => "HW33",
            ClimateVariable::TropicalNights => "TR25",
            ClimateVariable::WarmSpellDuration => "WSDI",
            ClimateVariable::ColdWaveDays => "CW12",
            ClimateVariable::FrostDays => "FD0",
            ClimateVariable::IceDays => "ID0",
            ClimateVariable::ColdSpellDuration => "CSDI",
            ClimateVariable::AnnualPrecipitation => "RN",
            ClimateVariable::MaxOneDayPrecip => "RX1DAY",
            ClimateVariable::MaxFiveDayPrecip => "RX5DAY",
            ClimateVariable::HeavyRainDays => "RAIN80",
            ClimateVariable::PrecipIntensity => "SDII",
            ClimateVariable::ConsecutiveDryDays => "CDD",
            ClimateVariable::Spei12 => "SPEI12",
            ClimateVariable::MaxWindSpeed => "WSMAX",
            ClimateVariable::StormDuration => "STORMDUR",
            ClimateVariable::SeaLevelRise => "SLR",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ClimateVariable::AnnualMeanTemp
            | ClimateVariable::AnnualMaxTemp
            | ClimateVariable::AnnualMinTemp => "degC",
            ClimateVariable::HeatwaveDays
            | ClimateVariable::TropicalNights
            | ClimateVariable::WarmSpellDuration
            | ClimateVariable::ColdWaveDays
            | ClimateVariable::FrostDays
            | ClimateVariable::IceDays
            | ClimateVariable::ColdSpellDuration
            | ClimateVariable::HeavyRainDays
            | ClimateVariable::ConsecutiveDryDays => "days",
            ClimateVariable::AnnualPrecipitation
            | ClimateVariable::MaxOneDayPrecip
            | ClimateVariable::MaxFiveDayPrecip => "mm",
            ClimateVariable::PrecipIntensity => "mm/day",
            ClimateVariable::Spei12 => "index",
            ClimateVariable::MaxWindSpeed => "m/s",
            ClimateVariable::StormDuration => "h",
            ClimateVariable::SeaLevelRise => "m",
        }
    }

    /// Statistical fallback constant (national ensemble mean).
    pub fn fallback_value(&self) -> f64 {
        match self {
            ClimateVariable::AnnualMeanTemp => 13.1,
            ClimateVariable::AnnualMaxTemp => 34.5,
            ClimateVariable::AnnualMinTemp => -13.0,
            ClimateVariable::HeatwaveDays => 14.0,
            ClimateVariable::TropicalNights => 9.0,
            ClimateVariable::WarmSpellDuration => 8.0,
            ClimateVariable::ColdWaveDays => 4.0,
            ClimateVariable::FrostDays => 95.0,
            ClimateVariable::IceDays => 10.0,
            ClimateVariable::ColdSpellDuration => 3.0,
            ClimateVariable::AnnualPrecipitation => 1300.0,
            ClimateVariable::MaxOneDayPrecip => 150.0,
            ClimateVariable::MaxFiveDayPrecip => 260.0,
            ClimateVariable::HeavyRainDays => 2.0,
            ClimateVariable::PrecipIntensity => 14.0,
            ClimateVariable::ConsecutiveDryDays => 22.0,
            ClimateVariable::Spei12 => 0.0,
            ClimateVariable::MaxWindSpeed => 24.0,
            ClimateVariable::StormDuration => 12.0,
            ClimateVariable::SeaLevelRise => 0.25,
        }
    }

    /// Archive stem: `{SCENARIO}_{CODE}_gridraw_yearly_2021-2100`
    pub fn archive_stem(&self, scenario: Scenario) -> String {
        format!("{}_{}_gridraw_yearly_2021-2100", scenario.as_str(), self.code())
    }
}

impl fmt::Display for ClimateVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Resolved scalar for one (scenario, variable, point, year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateFact {
    pub variable: ClimateVariable,
    pub scenario: Scenario,
    pub year: TargetYear,
    pub value: Sourced<f64>,
}

impl ClimateFact {
    pub fn from_grid(
        variable: ClimateVariable,
        scenario: Scenario,
        year: TargetYear,
        value: f64,
    ) -> Self {
        Self {
            variable,
            scenario,
            year,
            value: Sourced::resolved(value, DataSource::Grid),
        }
    }

    /// Fact carrying the variable's statistical fallback constant.
    pub fn fallback(
        variable: ClimateVariable,
        scenario: Scenario,
        year: TargetYear,
        reason: FallbackReason,
    ) -> Self {
        Self {
            variable,
            scenario,
            year,
            value: Sourced::fallback(variable.fallback_value(), reason),
        }
    }

    pub fn value(&self) -> f64 {
        self.value.get()
    }

    pub fn data_source(&self) -> DataSource {
        self.value.data_source()
    }

    pub fn is_fallback(&self) -> bool {
        self.value.is_fallback()
    }

    /// Human-readable warning if this fact fell back, `None` otherwise.
    pub fn warning(&self) -> Option<String> {
        self.value.fallback_reason().map(|reason| {
            format!(
                "{} {} {}: fallback {} {} used ({})",
                self.scenario,
                self.variable.code(),
                self.year,
                self.variable.fallback_value(),
                self.variable.unit(),
                reason
            )
        })
    }
}

/// The climate facts available to one (scenario, year) assessment.
///
/// Lookups of variables that were never resolved yield a fallback fact, so
/// consumers never handle absence themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateFactSet {
    scenario: Scenario,
    year: TargetYear,
    facts: BTreeMap<ClimateVariable, ClimateFact>,
}

impl ClimateFactSet {
    pub fn new(scenario: Scenario, year: TargetYear) -> Self {
        Self {
            scenario,
            year,
            facts: BTreeMap::new(),
        }
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn year(&self) -> TargetYear {
        self.year
    }

    pub fn insert(&mut self, fact: ClimateFact) {
        self.facts.insert(fact.variable, fact);
    }

    /// Builder-style insert of a grid value (handy for fixtures).
    pub fn with_value(mut self, variable: ClimateVariable, value: f64) -> Self {
        let fact = ClimateFact::from_grid(variable, self.scenario, self.year, value);
        self.insert(fact);
        self
    }

    pub fn get(&self, variable: ClimateVariable) -> ClimateFact {
        match self.facts.get(&variable) {
            Some(fact) => fact.clone(),
            None => ClimateFact::fallback(
                variable,
                self.scenario,
                self.year,
                FallbackReason::unavailable("variable not resolved for this assessment"),
            ),
        }
    }

    pub fn contains(&self, variable: ClimateVariable) -> bool {
        self.facts.contains_key(&variable)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClimateFact> {
        self.facts.values()
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn year() -> TargetYear {
        TargetYear::new(2050).unwrap()
    }

    #[test]
    fn test_codes_unique() {
        let mut codes: Vec<&str> = ClimateVariable::ALL.iter().map(|v| v.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), ClimateVariable::ALL.len());
    }

    #[test]
    fn test_archive_stem() {
        assert_eq!(
            ClimateVariable::AnnualMaxTemp.archive_stem(Scenario::SSP245),
            "SSP245_TXX_gridraw_yearly_2021-2100"
        );
    }

    #[test]
    fn test_fallback_fact() {
        let fact = ClimateFact::fallback(
            ClimateVariable::AnnualPrecipitation,
            Scenario::SSP126,
            year(),
            FallbackReason::unavailable("archive missing"),
        );
        assert_eq!(fact.value(), 1300.0);
        assert_eq!(fact.data_source(), DataSource::Fallback);
        let warning = fact.warning().unwrap();
        assert!(warning.contains("SSP126"));
        assert!(warning.contains("RN"));
    }

    #[test]
    fn test_grid_fact_has_no_warning() {
        let fact = ClimateFact::from_grid(ClimateVariable::Spei12, Scenario::SSP585, year(), -1.2);
        assert_eq!(fact.data_source(), DataSource::Grid);
        assert!(fact.warning().is_none());
    }

    #[test]
    fn test_fact_set_missing_is_fallback() {
        let set = ClimateFactSet::new(Scenario::SSP245, year())
            .with_value(ClimateVariable::HeatwaveDays, 40.0);
        assert_eq!(set.get(ClimateVariable::HeatwaveDays).value(), 40.0);

        let missing = set.get(ClimateVariable::AnnualMaxTemp);
        assert!(missing.is_fallback());
        assert_eq!(missing.value(), 34.5);
        assert_eq!(missing.scenario, Scenario::SSP245);
    }
}
