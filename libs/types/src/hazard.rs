//! Hazard categories

use crate::errors::RiskError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Physical climate hazard category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardType {
    ExtremeHeat,
    ExtremeCold,
    Drought,
    RiverFlood,
    UrbanFlood,
    /// Coastal inundation driven by sea-level rise
    CoastalFlood,
    Typhoon,
    Wildfire,
    WaterStress,
}

impl HazardType {
    pub const ALL: [HazardType; 9] = [
        HazardType::ExtremeHeat,
        HazardType::ExtremeCold,
        HazardType::Drought,
        HazardType::RiverFlood,
        HazardType::UrbanFlood,
        HazardType::CoastalFlood,
        HazardType::Typhoon,
        HazardType::Wildfire,
        HazardType::WaterStress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HazardType::ExtremeHeat => "extreme_heat",
            HazardType::ExtremeCold => "extreme_cold",
            HazardType::Drought => "drought",
            HazardType::RiverFlood => "river_flood",
            HazardType::UrbanFlood => "urban_flood",
            HazardType::CoastalFlood => "coastal_flood",
            HazardType::Typhoon => "typhoon",
            HazardType::Wildfire => "wildfire",
            HazardType::WaterStress => "water_stress",
        }
    }

    /// Flood-family hazards receive the exposure facts when vulnerability is
    /// scored.
    pub fn is_flood(&self) -> bool {
        matches!(
            self,
            HazardType::RiverFlood | HazardType::UrbanFlood | HazardType::CoastalFlood
        )
    }
}

impl fmt::Display for HazardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HazardType {
    type Err = RiskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match key.as_str() {
            "sea_level_rise" => return Ok(HazardType::CoastalFlood),
            "pluvial_flood" => return Ok(HazardType::UrbanFlood),
            _ => {}
        }
        HazardType::ALL
            .iter()
            .copied()
            .find(|h| h.as_str() == key)
            .ok_or_else(|| RiskError::UnknownHazard(s.to_string()))
    }
}
