//! Scores and risk tiers
//!
//! Uses rust_decimal so that `risk = H × E × V / 10000` is exact and
//! reproducible across platforms.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 0..100 score. Clamped and rounded (2 dp, half away from zero) on
/// construction, so an out-of-range score cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(Decimal);

impl Score {
    pub const ZERO: Score = Score(Decimal::ZERO);
    pub const MAX: Score = Score(Decimal::ONE_HUNDRED);

    /// Score from a floating-point computation. Non-finite values map to 0;
    /// finite values are clamped before conversion.
    pub fn new(value: f64) -> Self {
        if !value.is_finite() {
            return Score::ZERO;
        }
        let clamped = value.clamp(0.0, 100.0);
        let decimal = Decimal::from_f64_retain(clamped).unwrap_or(Decimal::ZERO);
        Self::from_decimal(
            decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Score from an exact decimal, clamped to [0, 100] without rounding.
    pub fn from_decimal(value: Decimal) -> Self {
        Score(value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
    }

    /// `H × E × V / 10000`, exact.
    ///
    /// Each factor is <= 100 so the result is <= 100 and never needs
    /// clamping; it is not rounded, which keeps the identity exact.
    pub fn compose(hazard: Score, exposure: Score, vulnerability: Score) -> Score {
        let product = hazard.0 * exposure.0 * vulnerability.0;
        Score::from_decimal(product / Decimal::from(10_000))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }
}

impl From<u8> for Score {
    fn from(value: u8) -> Self {
        Score::from_decimal(Decimal::from(value))
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Qualitative tier shared by hazard/exposure/vulnerability and risk levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Tier {
    /// Classify a score; boundaries are inclusive-lower.
    ///
    /// | Score    | Tier      |
    /// |----------|-----------|
    /// | >= 75    | very_high |
    /// | >= 50    | high      |
    /// | >= 25    | medium    |
    /// | < 25     | low       |
    pub fn from_score(score: Score) -> Tier {
        let value = score.as_decimal();
        if value >= Decimal::from(75) {
            Tier::VeryHigh
        } else if value >= Decimal::from(50) {
            Tier::High
        } else if value >= Decimal::from(25) {
            Tier::Medium
        } else {
            Tier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Medium => "medium",
            Tier::High => "high",
            Tier::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scenario-level risk label, serialized upper-case ("HIGH")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScenarioLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl From<Tier> for ScenarioLevel {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::Low => ScenarioLevel::Low,
            Tier::Medium => ScenarioLevel::Medium,
            Tier::High => ScenarioLevel::High,
            Tier::VeryHigh => ScenarioLevel::VeryHigh,
        }
    }
}
