//! Hazard engine
//!
//! Nine strategies turning climate facts (plus a few terrain facts) into a
//! 0-100 intensity score and a tier. Dispatch goes through a registry keyed
//! by [`HazardType`]; the composer never matches on hazard names.
//!
//! Hazard models never fail. A variable missing from the fact set resolves to
//! its statistical fallback and taints the result.

mod flood;
mod storm;
mod thermal;
mod water;
mod wildfire;

use std::collections::BTreeMap;

use types::assessment::HazardResult;
use types::climate::{ClimateFactSet, ClimateVariable};
use types::hazard::HazardType;
use types::site::{BuildingFact, SpatialFact};

pub use flood::{CoastalFloodHazard, RiverFloodHazard, UrbanFloodHazard};
pub use storm::TyphoonHazard;
pub use thermal::{ExtremeColdHazard, ExtremeHeatHazard};
pub use water::{DroughtHazard, WaterStressHazard};
pub use wildfire::WildfireHazard;

/// One hazard's scoring rule
pub trait HazardModel: Send + Sync {
    fn hazard_type(&self) -> HazardType;

    /// Climate variables `assess` reads; the composer resolves exactly these.
    fn required_variables(&self) -> &'static [ClimateVariable];

    /// Building facts are available to every model; most rules read only
    /// climate and terrain.
    fn assess(
        &self,
        climate: &ClimateFactSet,
        spatial: &SpatialFact,
        building: &BuildingFact,
    ) -> HazardResult;
}

/// Registry of hazard models
pub struct HazardEngine {
    models: BTreeMap<HazardType, Box<dyn HazardModel>>,
}

impl HazardEngine {
    /// Engine with the nine built-in models.
    pub fn new() -> Self {
        let mut engine = Self {
            models: BTreeMap::new(),
        };
        engine.register(Box::new(ExtremeHeatHazard));
        engine.register(Box::new(ExtremeColdHazard));
        engine.register(Box::new(DroughtHazard));
        engine.register(Box::new(RiverFloodHazard));
        engine.register(Box::new(UrbanFloodHazard));
        engine.register(Box::new(CoastalFloodHazard));
        engine.register(Box::new(TyphoonHazard));
        engine.register(Box::new(WildfireHazard));
        engine.register(Box::new(WaterStressHazard));
        engine
    }

    /// Install or replace the model for its hazard type.
    pub fn register(&mut self, model: Box<dyn HazardModel>) {
        self.models.insert(model.hazard_type(), model);
    }

    /// Remove a hazard's model; the composer then skips that hazard.
    pub fn deregister(&mut self, hazard: HazardType) -> Option<Box<dyn HazardModel>> {
        self.models.remove(&hazard)
    }

    pub fn model(&self, hazard: HazardType) -> Option<&dyn HazardModel> {
        self.models.get(&hazard).map(|m| m.as_ref())
    }

    /// Variables the hazard's model reads (empty if none is registered).
    pub fn required_variables(&self, hazard: HazardType) -> &'static [ClimateVariable] {
        self.model(hazard)
            .map(|m| m.required_variables())
            .unwrap_or(&[])
    }

    pub fn assess(
        &self,
        hazard: HazardType,
        climate: &ClimateFactSet,
        spatial: &SpatialFact,
        building: &BuildingFact,
    ) -> Option<HazardResult> {
        self.model(hazard).map(|m| m.assess(climate, spatial, building))
    }
}

impl Default for HazardEngine {
    fn default() -> Self {
        Self::new()
    }
}
