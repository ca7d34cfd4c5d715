//! Gridded climate data access
//!
//! Resolves (scenario, variable, point, year) to a [`ClimateFact`] by
//! nearest-grid-cell lookup (no interpolation). Anything short of an invalid
//! year resolves: missing, corrupt or short archives and fill cells yield the
//! variable's statistical fallback tagged `fallback`.

pub mod archive;
pub mod cache;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;
use types::climate::{ClimateFact, ClimateFactSet, ClimateVariable};
use types::errors::RiskError;
use types::geo::GeoPoint;
use types::scenario::{Scenario, TargetYear, BASE_YEAR, END_YEAR};
use types::sourced::FallbackReason;

use self::archive::{is_valid_cell, nearest_index, ArchiveSource, FsArchiveSource};
use self::cache::{CacheStats, DatasetCache, DatasetSlot};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("year {year} outside archive range {min}-{max}")]
    OutOfRangeYear { year: i32, min: i32, max: i32 },
}

impl From<GridError> for RiskError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::OutOfRangeYear { year, min, max } => {
                RiskError::OutOfRangeYear { year, min, max }
            }
        }
    }
}

/// Nearest-cell accessor over a scenario-partitioned archive set
#[derive(Clone)]
pub struct GridDataAccessor {
    source: Arc<dyn ArchiveSource>,
    cache: Arc<DatasetCache>,
}

impl GridDataAccessor {
    /// Accessor over `source` sharing the given cache.
    pub fn new(source: Arc<dyn ArchiveSource>, cache: Arc<DatasetCache>) -> Self {
        Self { source, cache }
    }

    /// Filesystem accessor with its own fresh cache.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        Self::new(
            Arc::new(FsArchiveSource::new(root)),
            Arc::new(DatasetCache::new()),
        )
    }

    pub fn cache(&self) -> &Arc<DatasetCache> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Resolve one value. Fails only for years outside 2021-2100.
    pub fn resolve(
        &self,
        scenario: Scenario,
        variable: ClimateVariable,
        point: GeoPoint,
        year: i32,
    ) -> Result<ClimateFact, GridError> {
        let year = TargetYear::new(year).map_err(|_| GridError::OutOfRangeYear {
            year,
            min: BASE_YEAR,
            max: END_YEAR,
        })?;
        Ok(self.resolve_year(scenario, variable, point, year))
    }

    /// Resolve one value for an already validated year. Never fails.
    pub fn resolve_year(
        &self,
        scenario: Scenario,
        variable: ClimateVariable,
        point: GeoPoint,
        year: TargetYear,
    ) -> ClimateFact {
        let slot = self
            .cache
            .get_or_open(self.source.as_ref(), scenario, variable);

        let grid = match slot {
            DatasetSlot::Loaded(grid) => grid,
            DatasetSlot::Unavailable { reason } => {
                return ClimateFact::fallback(
                    variable,
                    scenario,
                    year,
                    FallbackReason::unavailable(reason),
                );
            }
        };

        let fallback = |detail: String| {
            warn!(
                scenario = %scenario,
                variable = variable.code(),
                year = year.value(),
                lat = point.lat(),
                lon = point.lon(),
                detail = %detail,
                "Climate value unavailable, using fallback"
            );
            ClimateFact::fallback(variable, scenario, year, FallbackReason::unavailable(detail))
        };

        let offset = year.value() - grid.base_year;
        if offset < 0 || offset as usize >= grid.time_steps() {
            return fallback(format!(
                "year {} beyond archive axis {}+{}",
                year,
                grid.base_year,
                grid.time_steps()
            ));
        }

        let (lat_idx, lon_idx) = match (
            nearest_index(&grid.lats, point.lat()),
            nearest_index(&grid.lons, point.lon()),
        ) {
            (Some(i), Some(j)) => (i, j),
            _ => return fallback("archive has no coordinates".to_string()),
        };

        match grid.value_at(offset as usize, lat_idx, lon_idx) {
            Some(value) if is_valid_cell(value) => {
                ClimateFact::from_grid(variable, scenario, year, f64::from(value))
            }
            Some(_) => fallback(format!(
                "fill value at cell ({}, {})",
                grid.lats[lat_idx], grid.lons[lon_idx]
            )),
            None => fallback("cell outside archive".to_string()),
        }
    }

    /// Resolve every variable in `variables` for one (scenario, year).
    pub fn resolve_set(
        &self,
        scenario: Scenario,
        variables: &[ClimateVariable],
        point: GeoPoint,
        year: TargetYear,
    ) -> ClimateFactSet {
        let mut set = ClimateFactSet::new(scenario, year);
        for &variable in variables {
            set.insert(self.resolve_year(scenario, variable, point, year));
        }
        set
    }
}
