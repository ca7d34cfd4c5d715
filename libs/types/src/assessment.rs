//! Hazard / Exposure / Vulnerability layer results

use crate::score::{Score, Tier};
use crate::sourced::{DataSource, Sourced};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Outcome of one H, E or V assessment.
///
/// `factors` is the audit trail: every input and intermediate value that
/// produced the score. `data_source` is `Fallback` as soon as any consumed
/// input fell back, and `warnings` says which.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerResult {
    pub score: Score,
    pub tier: Tier,
    pub factors: BTreeMap<String, Value>,
    pub data_source: DataSource,
    pub warnings: Vec<String>,
}

pub type HazardResult = LayerResult;
pub type ExposureResult = LayerResult;
pub type VulnerabilityResult = LayerResult;

impl LayerResult {
    /// Numeric factor lookup.
    pub fn factor_f64(&self, name: &str) -> Option<f64> {
        self.factors.get(name).and_then(Value::as_f64)
    }

    pub fn factor_str(&self, name: &str) -> Option<&str> {
        self.factors.get(name).and_then(Value::as_str)
    }

    pub fn is_fallback(&self) -> bool {
        self.data_source == DataSource::Fallback
    }
}

/// Accumulates factors, provenance and warnings while a rule runs.
#[derive(Debug, Clone)]
pub struct LayerBuilder {
    factors: BTreeMap<String, Value>,
    data_source: DataSource,
    warnings: Vec<String>,
}

impl LayerBuilder {
    /// `base` is the source of a result with no inputs at all: `Grid` for
    /// hazards, `Provider` for exposure and vulnerability.
    pub fn new(base: DataSource) -> Self {
        Self {
            factors: BTreeMap::new(),
            data_source: base,
            warnings: Vec::new(),
        }
    }

    pub fn factor(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.factors.insert(name.to_string(), value.into());
        self
    }

    /// Record a float factor. Non-finite values are stored as null.
    pub fn number(&mut self, name: &str, value: f64) -> &mut Self {
        let v = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null);
        self.factors.insert(name.to_string(), v);
        self
    }

    /// Unwrap a sourced input, recording its value, provenance and any
    /// fallback warning.
    pub fn input<T>(&mut self, name: &str, input: Sourced<T>) -> T
    where
        T: Clone + Serialize,
    {
        self.data_source = self.data_source.merge(input.data_source());
        if let Some(reason) = input.fallback_reason() {
            self.warnings.push(format!("{}: fallback used ({})", name, reason));
        }
        let value = input.into_value();
        let json = serde_json::to_value(&value).unwrap_or(Value::Null);
        self.factors.insert(name.to_string(), json);
        value
    }

    /// Record a resolved climate input (value, source and warning).
    pub fn climate(&mut self, name: &str, fact: &crate::climate::ClimateFact) -> f64 {
        self.data_source = self.data_source.merge(fact.data_source());
        if let Some(warning) = fact.warning() {
            self.warnings.push(warning);
        }
        self.number(name, fact.value());
        fact.value()
    }

    pub fn warn(&mut self, warning: impl Into<String>) -> &mut Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn taint(&mut self) -> &mut Self {
        self.data_source = DataSource::Fallback;
        self
    }

    pub fn finish(self, score: Score, tier: Tier) -> LayerResult {
        LayerResult {
            score,
            tier,
            factors: self.factors,
            data_source: self.data_source,
            warnings: self.warnings,
        }
    }

    /// Finish with the tier derived from the score.
    pub fn finish_scored(self, score: Score) -> LayerResult {
        let tier = Tier::from_score(score);
        self.finish(score, tier)
    }
}
