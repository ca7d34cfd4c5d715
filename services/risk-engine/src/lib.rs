//! Physical climate risk engine
//!
//! Composes per-hazard risk for a location from three layers:
//! - Hazard: climate intensity from gridded scenario projections
//! - Exposure: how much of the asset stands in the hazard's way
//! - Vulnerability: how badly the building suffers when hit
//!
//! `risk = H × E × V / 10000`, for nine hazards under four SSP scenarios.
//! Data gaps never fail a composition; they resolve to documented fallbacks
//! and are reported as warnings.

pub mod batch;
pub mod config;
pub mod engine;
pub mod exposure;
pub mod grid;
pub mod hazard;
pub mod ladder;
pub mod providers;
pub mod validator;
pub mod vulnerability;

pub use batch::{BatchError, BatchOutcome, BatchRunner};
pub use config::{ConfigError, EngineConfig};
pub use engine::{HazardAssessment, RiskComposer};
pub use grid::{GridDataAccessor, GridError};

/// Version recorded in report metadata.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
