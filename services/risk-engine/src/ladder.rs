//! Threshold ladders
//!
//! Most scoring rules map one measured value onto a short table of
//! (threshold, score, tier) rungs. Rungs are listed most severe first and the
//! first rung the value satisfies wins; a value that satisfies none gets the
//! ladder's floor.

use types::score::Tier;

/// How a value is compared against a rung threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// value > threshold
    Above,
    /// value >= threshold
    AtLeast,
    /// value < threshold
    Below,
    /// value <= threshold
    AtMost,
}

impl Bound {
    fn admits(self, value: f64, threshold: f64) -> bool {
        match self {
            Bound::Above => value > threshold,
            Bound::AtLeast => value >= threshold,
            Bound::Below => value < threshold,
            Bound::AtMost => value <= threshold,
        }
    }
}

/// One row of a ladder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rung {
    pub threshold: f64,
    pub score: u8,
    pub tier: Tier,
}

/// Ordered threshold table
#[derive(Debug, Clone, Copy)]
pub struct Ladder {
    bound: Bound,
    rungs: &'static [Rung],
    floor: (u8, Tier),
}

impl Ladder {
    pub const fn new(bound: Bound, rungs: &'static [Rung], floor: (u8, Tier)) -> Self {
        Self {
            bound,
            rungs,
            floor,
        }
    }

    /// Score and tier for `value`. NaN satisfies no rung and lands on the floor.
    pub fn classify(&self, value: f64) -> (u8, Tier) {
        self.rungs
            .iter()
            .find(|rung| self.bound.admits(value, rung.threshold))
            .map(|rung| (rung.score, rung.tier))
            .unwrap_or(self.floor)
    }
}

/// Shorthand for ladder tables.
pub const fn rung(threshold: f64, score: u8, tier: Tier) -> Rung {
    Rung {
        threshold,
        score,
        tier,
    }
}

/// The 90 / 75 / 50 / 25 ladder shared by most hazard indices.
pub const fn standard(bound: Bound, very_high: f64, high: f64, medium: f64) -> [Rung; 3] {
    [
        rung(very_high, 90, Tier::VeryHigh),
        rung(high, 75, Tier::High),
        rung(medium, 50, Tier::Medium),
    ]
}

/// Floor of the standard ladder.
pub const STANDARD_FLOOR: (u8, Tier) = (25, Tier::Low);
