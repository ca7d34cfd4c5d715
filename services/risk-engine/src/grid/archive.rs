//! Climate archive codec
//!
//! One archive holds one (scenario, variable) time series on a regular
//! lat/lon grid. On disk:
//!
//! ```text
//! {root}/{SCENARIO}/{SCENARIO}_{CODE}_gridraw_yearly_2021-2100.grid.zst
//!   = zstd(bincode(ArchiveFile { version, checksum, grid }))
//! ```
//!
//! `checksum` is the SHA-256 of `bincode(grid)`. Readers reject unknown
//! versions, checksum mismatches and grids whose value count does not match
//! `time × lat × lon`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use types::climate::ClimateVariable;
use types::scenario::{Scenario, BASE_YEAR};

/// Current archive format version.
pub const ARCHIVE_VERSION: u32 = 1;

/// File extension appended to the archive stem.
pub const ARCHIVE_EXTENSION: &str = "grid.zst";

/// Cells with an absolute value at or above this are fill values (sea, no data).
pub const FILL_THRESHOLD: f32 = 1.0e20;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive not found: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Integrity check failed: expected {expected}, got {actual}")]
    IntegrityFailure { expected: String, actual: String },

    #[error("Unsupported archive version: {0}")]
    UnsupportedVersion(u32),

    #[error("Malformed grid: {0}")]
    Malformed(String),

    #[error("Archive holds {found}, expected {expected}")]
    KeyMismatch { expected: String, found: String },
}

// ── Grid ────────────────────────────────────────────────────────────

/// Immutable gridded time series for one (scenario, variable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateGrid {
    pub scenario: Scenario,
    pub variable: ClimateVariable,
    /// Year of time index 0
    pub base_year: i32,
    /// Latitude coordinate vector (degrees north)
    pub lats: Vec<f64>,
    /// Longitude coordinate vector (degrees east)
    pub lons: Vec<f64>,
    /// Values laid out `[time][lat][lon]`
    pub values: Vec<f32>,
}

impl ClimateGrid {
    /// Build a grid with a time axis starting at [`BASE_YEAR`].
    pub fn new(
        scenario: Scenario,
        variable: ClimateVariable,
        lats: Vec<f64>,
        lons: Vec<f64>,
        values: Vec<f32>,
    ) -> Self {
        Self {
            scenario,
            variable,
            base_year: BASE_YEAR,
            lats,
            lons,
            values,
        }
    }

    /// Number of yearly steps on the time axis.
    pub fn time_steps(&self) -> usize {
        let cells = self.lats.len() * self.lons.len();
        if cells == 0 {
            0
        } else {
            self.values.len() / cells
        }
    }

    /// Check shape consistency.
    pub fn validate(&self) -> Result<(), ArchiveError> {
        if self.lats.is_empty() || self.lons.is_empty() {
            return Err(ArchiveError::Malformed("empty coordinate vector".to_string()));
        }
        if self.lats.iter().chain(self.lons.iter()).any(|c| !c.is_finite()) {
            return Err(ArchiveError::Malformed("non-finite coordinate".to_string()));
        }
        let cells = self.lats.len() * self.lons.len();
        if self.values.is_empty() || self.values.len() % cells != 0 {
            return Err(ArchiveError::Malformed(format!(
                "{} values do not fill {} x {} cells",
                self.values.len(),
                self.lats.len(),
                self.lons.len()
            )));
        }
        Ok(())
    }

    /// Raw cell value, `None` outside the grid.
    pub fn value_at(&self, time: usize, lat_idx: usize, lon_idx: usize) -> Option<f32> {
        if time >= self.time_steps() || lat_idx >= self.lats.len() || lon_idx >= self.lons.len() {
            return None;
        }
        let idx = (time * self.lats.len() + lat_idx) * self.lons.len() + lon_idx;
        self.values.get(idx).copied()
    }

    fn compute_hash(&self) -> Result<String, ArchiveError> {
        let bytes =
            bincode::serialize(self).map_err(|e| ArchiveError::Serialization(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Whether a raw cell value is usable.
pub fn is_valid_cell(value: f32) -> bool {
    value.is_finite() && value.abs() < FILL_THRESHOLD
}

/// Index of the coordinate closest to `target`; ties resolve to the lower
/// index. `None` for an empty vector.
pub fn nearest_index(coords: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in coords.iter().enumerate() {
        let diff = (c - target).abs();
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((i, diff)),
        }
    }
    best.map(|(i, _)| i)
}

// ── Archive file ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ArchiveFile {
    version: u32,
    checksum: String,
    grid: ClimateGrid,
}

/// Path of the archive for (scenario, variable) under `root`.
pub fn archive_path(root: &Path, scenario: Scenario, variable: ClimateVariable) -> PathBuf {
    root.join(scenario.as_str()).join(format!(
        "{}.{}",
        variable.archive_stem(scenario),
        ARCHIVE_EXTENSION
    ))
}

/// Source of climate grids. The filesystem implementation is the default;
/// tests and the warehousing side can supply their own.
pub trait ArchiveSource: Send + Sync {
    fn open(&self, scenario: Scenario, variable: ClimateVariable)
        -> Result<ClimateGrid, ArchiveError>;

    /// Human-readable location of the archive, for logs and warnings.
    fn describe(&self, scenario: Scenario, variable: ClimateVariable) -> String;
}

/// Reads archives from a directory tree.
#[derive(Debug, Clone)]
pub struct FsArchiveSource {
    root: PathBuf,
}

impl FsArchiveSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read and verify a single archive file.
    pub fn read(path: &Path) -> Result<ClimateGrid, ArchiveError> {
        let mut file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ArchiveError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(ArchiveError::Io(e)),
        };
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let decompressed = zstd::decode_all(data.as_slice())
            .map_err(|e| ArchiveError::Compression(e.to_string()))?;

        let archive: ArchiveFile = bincode::deserialize(&decompressed)
            .map_err(|e| ArchiveError::Serialization(e.to_string()))?;

        if archive.version > ARCHIVE_VERSION {
            return Err(ArchiveError::UnsupportedVersion(archive.version));
        }

        let actual = archive.grid.compute_hash()?;
        if actual != archive.checksum {
            return Err(ArchiveError::IntegrityFailure {
                expected: archive.checksum,
                actual,
            });
        }

        archive.grid.validate()?;
        Ok(archive.grid)
    }
}

impl ArchiveSource for FsArchiveSource {
    fn open(
        &self,
        scenario: Scenario,
        variable: ClimateVariable,
    ) -> Result<ClimateGrid, ArchiveError> {
        let grid = Self::read(&archive_path(&self.root, scenario, variable))?;
        if grid.scenario != scenario || grid.variable != variable {
            return Err(ArchiveError::KeyMismatch {
                expected: variable.archive_stem(scenario),
                found: grid.variable.archive_stem(grid.scenario),
            });
        }
        Ok(grid)
    }

    fn describe(&self, scenario: Scenario, variable: ClimateVariable) -> String {
        archive_path(&self.root, scenario, variable)
            .display()
            .to_string()
    }
}

// ── Writer ──────────────────────────────────────────────────────────

/// Writes archives atomically (tmp file, fsync, rename).
pub struct ArchiveWriter {
    root: PathBuf,
    level: i32,
}

impl ArchiveWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            level: 3,
        }
    }

    pub fn with_compression_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn write(&self, grid: &ClimateGrid) -> Result<PathBuf, ArchiveError> {
        grid.validate()?;

        let archive = ArchiveFile {
            version: ARCHIVE_VERSION,
            checksum: grid.compute_hash()?,
            grid: grid.clone(),
        };
        let data = bincode::serialize(&archive)
            .map_err(|e| ArchiveError::Serialization(e.to_string()))?;
        let compressed = zstd::encode_all(data.as_slice(), self.level)
            .map_err(|e| ArchiveError::Compression(e.to_string()))?;

        let path = archive_path(&self.root, grid.scenario, grid.variable);
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir)?;

        let tmp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&compressed)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;

        Ok(path)
    }
}
