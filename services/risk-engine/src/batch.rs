//! Batch precompute
//!
//! Maps the composer over many locations on scoped worker threads. Each
//! worker builds its own composer (and so its own dataset cache) through the
//! factory; nothing is shared between workers. Outcomes come back in input
//! order and one location's failure never affects another.

use std::time::Instant;

use thiserror::Error;
use tracing::{info, warn};
use types::errors::RiskError;
use types::report::RiskReport;
use types::scenario::Scenario;

use crate::config::EngineConfig;
use crate::engine::RiskComposer;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error("worker panicked while composing")]
    WorkerPanicked,
}

/// Result for one input location
#[derive(Debug)]
pub struct BatchOutcome {
    /// Position in the input slice
    pub index: usize,
    pub lat: f64,
    pub lon: f64,
    pub result: Result<RiskReport, BatchError>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

type ComposerFactory = Box<dyn Fn() -> RiskComposer + Send + Sync>;

/// Parallel multi-location composer
pub struct BatchRunner {
    workers: usize,
    factory: ComposerFactory,
}

impl BatchRunner {
    /// `workers` is clamped to at least one.
    pub fn new<F>(workers: usize, factory: F) -> Self
    where
        F: Fn() -> RiskComposer + Send + Sync + 'static,
    {
        Self {
            workers: workers.max(1),
            factory: Box::new(factory),
        }
    }

    /// Runner whose workers each build a composer from `config`.
    pub fn from_config(config: EngineConfig) -> Self {
        let workers = config.batch_workers;
        Self::new(workers, move || RiskComposer::with_config(config.clone()))
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Compose every `(lat, lon)`; output order equals input order.
    pub fn run(
        &self,
        coordinates: &[(f64, f64)],
        year: i32,
        scenarios: &[Scenario],
    ) -> Vec<BatchOutcome> {
        if coordinates.is_empty() {
            return Vec::new();
        }

        let started = Instant::now();
        let chunk_size = coordinates.len().div_ceil(self.workers);
        info!(
            locations = coordinates.len(),
            workers = self.workers,
            chunk_size,
            year,
            "Batch started"
        );

        let mut outcomes = Vec::with_capacity(coordinates.len());
        std::thread::scope(|s| {
            let handles: Vec<_> = coordinates
                .chunks(chunk_size)
                .enumerate()
                .map(|(chunk_idx, chunk)| {
                    let offset = chunk_idx * chunk_size;
                    let handle = s.spawn(move || {
                        let composer = (self.factory)();
                        chunk
                            .iter()
                            .enumerate()
                            .map(|(i, &(lat, lon))| BatchOutcome {
                                index: offset + i,
                                lat,
                                lon,
                                result: composer
                                    .compose_at(lat, lon, year, scenarios)
                                    .map_err(BatchError::from),
                            })
                            .collect::<Vec<_>>()
                    });
                    (offset, chunk, handle)
                })
                .collect();

            for (offset, chunk, handle) in handles {
                match handle.join() {
                    Ok(chunk_outcomes) => outcomes.extend(chunk_outcomes),
                    Err(_) => {
                        warn!(offset, locations = chunk.len(), "Batch worker panicked");
                        outcomes.extend(chunk.iter().enumerate().map(|(i, &(lat, lon))| {
                            BatchOutcome {
                                index: offset + i,
                                lat,
                                lon,
                                result: Err(BatchError::WorkerPanicked),
                            }
                        }));
                    }
                }
            }
        });

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!(
            locations = outcomes.len(),
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch finished"
        );
        outcomes
    }
}
