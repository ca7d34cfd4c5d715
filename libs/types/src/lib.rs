//! Types library for the physical climate risk engine
//!
//! Core type definitions shared by the risk engine and its collaborators:
//! validated locations and years, the climate variable catalog,
//! provenance-tagged facts, scores, and the composed report.
//!
//! # Modules
//! - `geo`: Validated `GeoPoint` and the supported bounding box
//! - `scenario`: Emission scenarios and target years
//! - `hazard`: The nine hazard categories
//! - `climate`: Climate variable catalog and resolved climate facts
//! - `sourced`: `Sourced<T>` provenance and fallback reasons
//! - `site`: Spatial and building facts from collaborators
//! - `score`: Clamped decimal scores and tiers
//! - `assessment`: H/E/V layer results
//! - `report`: Risk scores and the per-location report
//! - `errors`: Error taxonomy

// Public modules
pub mod geo;
pub mod scenario;
pub mod hazard;
pub mod climate;
pub mod sourced;
pub mod site;
pub mod score;
pub mod assessment;
pub mod report;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::assessment::*;
    pub use crate::climate::*;
    pub use crate::errors::*;
    pub use crate::geo::*;
    pub use crate::hazard::*;
    pub use crate::report::*;
    pub use crate::scenario::*;
    pub use crate::score::*;
    pub use crate::site::*;
    pub use crate::sourced::*;
}
