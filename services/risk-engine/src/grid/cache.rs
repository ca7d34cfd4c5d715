//! Process-lifetime dataset cache
//!
//! One slot per (scenario, variable), filled on first access and never
//! evicted. The key space is fixed (4 scenarios × 20 variables) so the cache
//! is bounded. Failed opens are cached as well, so a missing archive costs
//! one IO attempt per process rather than one per lookup.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, warn};
use types::climate::ClimateVariable;
use types::scenario::Scenario;

use super::archive::{ArchiveError, ArchiveSource, ClimateGrid};

/// Cache key
pub type GridKey = (Scenario, ClimateVariable);

/// Cached outcome of opening one archive
#[derive(Debug, Clone)]
pub enum DatasetSlot {
    Loaded(Arc<ClimateGrid>),
    Unavailable { reason: String },
}

impl DatasetSlot {
    pub fn grid(&self) -> Option<&Arc<ClimateGrid>> {
        match self {
            DatasetSlot::Loaded(grid) => Some(grid),
            DatasetSlot::Unavailable { .. } => None,
        }
    }
}

/// Cache hit/miss counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Shared, thread-safe dataset cache
#[derive(Debug, Default)]
pub struct DatasetCache {
    slots: DashMap<GridKey, DatasetSlot>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the slot for `key`, opening the archive on first access.
    ///
    /// The shard lock is held while loading, so concurrent first accesses to
    /// the same key open the archive once.
    pub fn get_or_open(
        &self,
        source: &dyn ArchiveSource,
        scenario: Scenario,
        variable: ClimateVariable,
    ) -> DatasetSlot {
        let key = (scenario, variable);
        if let Some(slot) = self.slots.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return slot.clone();
        }

        let mut opened = false;
        let slot = self
            .slots
            .entry(key)
            .or_insert_with(|| {
                opened = true;
                load(source, scenario, variable)
            })
            .clone();

        // Another reader may have filled the slot between `get` and `entry`.
        if opened {
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        slot
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.slots.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every slot. Only meant for process shutdown.
    pub fn clear(&self) {
        self.slots.clear();
    }
}

fn load(source: &dyn ArchiveSource, scenario: Scenario, variable: ClimateVariable) -> DatasetSlot {
    let location = source.describe(scenario, variable);
    match source.open(scenario, variable) {
        Ok(grid) => {
            debug!(
                scenario = %scenario,
                variable = variable.code(),
                lats = grid.lats.len(),
                lons = grid.lons.len(),
                years = grid.time_steps(),
                "Climate archive opened"
            );
            DatasetSlot::Loaded(Arc::new(grid))
        }
        Err(e) => {
            match &e {
                ArchiveError::NotFound(_) => debug!(
                    scenario = %scenario,
                    variable = variable.code(),
                    archive = %location,
                    "Climate archive missing"
                ),
                _ => warn!(
                    scenario = %scenario,
                    variable = variable.code(),
                    archive = %location,
                    error = %e,
                    "Climate archive unreadable"
                ),
            }
            DatasetSlot::Unavailable {
                reason: format!("{} ({})", e, location),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Counts opens; serves a 1×1×1 grid for TXX, nothing else.
    struct CountingSource {
        opens: AtomicUsize,
    }

    impl ArchiveSource for CountingSource {
        fn open(
            &self,
            scenario: Scenario,
            variable: ClimateVariable,
        ) -> Result<ClimateGrid, ArchiveError> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            if variable == ClimateVariable::AnnualMaxTemp {
                Ok(ClimateGrid::new(scenario, variable, vec![37.0], vec![127.0], vec![33.0]))
            } else {
                Err(ArchiveError::NotFound("memory".into()))
            }
        }

        fn describe(&self, scenario: Scenario, variable: ClimateVariable) -> String {
            format!("memory://{}", variable.archive_stem(scenario))
        }
    }

    fn source() -> CountingSource {
        CountingSource {
            opens: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_first_access_opens_then_hits() {
        let cache = DatasetCache::new();
        let src = source();

        let first = cache.get_or_open(&src, Scenario::SSP245, ClimateVariable::AnnualMaxTemp);
        assert!(first.grid().is_some());
        let second = cache.get_or_open(&src, Scenario::SSP245, ClimateVariable::AnnualMaxTemp);
        assert!(second.grid().is_some());

        assert_eq!(src.opens.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_failures_cached() {
        let cache = DatasetCache::new();
        let src = source();

        for _ in 0..3 {
            let slot = cache.get_or_open(&src, Scenario::SSP126, ClimateVariable::Spei12);
            assert!(matches!(slot, DatasetSlot::Unavailable { .. }));
        }
        assert_eq!(src.opens.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_keys_are_scenario_specific() {
        let cache = DatasetCache::new();
        let src = source();
        cache.get_or_open(&src, Scenario::SSP126, ClimateVariable::AnnualMaxTemp);
        cache.get_or_open(&src, Scenario::SSP585, ClimateVariable::AnnualMaxTemp);
        assert_eq!(cache.len(), 2);
        assert_eq!(src.opens.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_readers_open_once() {
        let cache = Arc::new(DatasetCache::new());
        let src = Arc::new(source());

        std::thread::scope(|s| {
            for _ in 0..8 {
                let cache = Arc::clone(&cache);
                let src = Arc::clone(&src);
                s.spawn(move || {
                    for _ in 0..50 {
                        let slot = cache.get_or_open(
                            src.as_ref(),
                            Scenario::SSP370,
                            ClimateVariable::AnnualMaxTemp,
                        );
                        assert!(slot.grid().is_some());
                    }
                });
            }
        });

        assert_eq!(src.opens.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats().hits + cache.stats().misses, 400);
    }
}
