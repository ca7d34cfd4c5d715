//! Emission scenarios and target years

use crate::errors::RiskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First year of the projection axis. Time index = year - BASE_YEAR.
pub const BASE_YEAR: i32 = 2021;
/// Last year of the projection axis.
pub const END_YEAR: i32 = 2100;

/// Shared Socioeconomic Pathway emission scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Scenario {
    /// Sustainability, low emissions
    SSP126,
    /// Middle of the road
    SSP245,
    /// Regional rivalry
    SSP370,
    /// Fossil-fueled development, high emissions
    SSP585,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Scenario::SSP126,
        Scenario::SSP245,
        Scenario::SSP370,
        Scenario::SSP585,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::SSP126 => "SSP126",
            Scenario::SSP245 => "SSP245",
            Scenario::SSP370 => "SSP370",
            Scenario::SSP585 => "SSP585",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "SSP126" => Ok(Scenario::SSP126),
            "SSP245" => Ok(Scenario::SSP245),
            "SSP370" => Ok(Scenario::SSP370),
            "SSP585" => Ok(Scenario::SSP585),
            _ => Err(RiskError::UnknownScenario(s.to_string())),
        }
    }
}

/// A projection year validated to [`BASE_YEAR`, `END_YEAR`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct TargetYear(i32);

impl TargetYear {
    pub fn new(year: i32) -> Result<Self, RiskError> {
        if !(BASE_YEAR..=END_YEAR).contains(&year) {
            return Err(RiskError::OutOfRangeYear {
                year,
                min: BASE_YEAR,
                max: END_YEAR,
            });
        }
        Ok(Self(year))
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    /// Index into an archive's yearly time axis.
    pub fn time_index(&self) -> usize {
        (self.0 - BASE_YEAR) as usize
    }
}

impl TryFrom<i32> for TargetYear {
    type Error = RiskError;

    fn try_from(year: i32) -> Result<Self, Self::Error> {
        TargetYear::new(year)
    }
}

impl From<TargetYear> for i32 {
    fn from(year: TargetYear) -> Self {
        year.0
    }
}

impl fmt::Display for TargetYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_parse() {
        assert_eq!("SSP245".parse::<Scenario>().unwrap(), Scenario::SSP245);
        assert_eq!("ssp5-8.5".parse::<Scenario>().unwrap(), Scenario::SSP585);
        assert!("RCP45".parse::<Scenario>().is_err());
    }

    #[test]
    fn test_scenario_serde_uppercase() {
        let json = serde_json::to_string(&Scenario::SSP370).unwrap();
        assert_eq!(json, "\"SSP370\"");
    }

    #[test]
    fn test_year_bounds() {
        assert!(TargetYear::new(2021).is_ok());
        assert!(TargetYear::new(2100).is_ok());
        assert!(matches!(
            TargetYear::new(2020),
            Err(RiskError::OutOfRangeYear { year: 2020, .. })
        ));
        assert!(TargetYear::new(2101).is_err());
    }

    #[test]
    fn test_time_index() {
        assert_eq!(TargetYear::new(2021).unwrap().time_index(), 0);
        assert_eq!(TargetYear::new(2050).unwrap().time_index(), 29);
        assert_eq!(TargetYear::new(2100).unwrap().time_index(), 79);
    }

    #[test]
    fn test_year_deserialize_validates() {
        let y: TargetYear = serde_json::from_str("2050").unwrap();
        assert_eq!(y.value(), 2050);
        assert!(serde_json::from_str::<TargetYear>("1999").is_err());
    }
}
